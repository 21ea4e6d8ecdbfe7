use log::trace;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::ast::{Condition, Expr};
use crate::function::Call;
use crate::path::Reference;

pub(crate) const IDENTIFIER: &str = r"[_\pL\p{Nl}][_\pL\p{Nl}\d]*";
const ARRAY: &str = r"\[[0-9]+\]";
pub(crate) const SPECIAL: &str = r"@(?:index|key|value|first)";

/// `identifier(.identifier | [digits] | .[digits])*` or a special token.
pub(crate) fn key_pattern() -> String {
    format!(
        r"(?:{special}|{ident}(?:\.{ident}|\.?{array})*)",
        special = SPECIAL,
        ident = IDENTIFIER,
        array = ARRAY
    )
}

fn args_pattern() -> String {
    format!(r"(?:[ ]*,[ ]*{})*", key_pattern())
}

/// Alternatives are tried left to right at each position, so function calls
/// take precedence over plain variables and function conditions over plain
/// ones.
static MARKUP: Lazy<Regex> = Lazy::new(|| {
    let key = key_pattern();
    let args = args_pattern();
    let pattern = [
        format!(
            r"\{{function\.(?P<call_name>{ident})(?P<call_args>{args})\}}",
            ident = IDENTIFIER,
            args = args
        ),
        format!(r"\{{(?P<var_parent>\.\./)?(?P<var_path>{key})\}}", key = key),
        format!(
            r"<!-- IF (?P<iff>(?P<iff_not>!?)function\.(?P<iff_name>{ident})(?P<iff_args>{args})) -->[\r\n]*",
            ident = IDENTIFIER,
            args = args
        ),
        format!(
            r"<!-- IF (?P<if>(?P<if_not>!?)(?P<if_parent>\.\./)?(?P<if_path>{key})) -->[\r\n]*",
            key = key
        ),
        r"(?P<else><!-- ELSE -->)[\r\n]*".to_string(),
        format!(
            r"<!-- ENDIF (?P<endif>!?(?:\.\./)?{key}{args}) -->",
            key = key,
            args = args
        ),
        format!(r"<!-- BEGIN (?P<begin>{key}) -->[\r\n]*", key = key),
        format!(r"<!-- END (?P<end>{key}) -->", key = key),
    ]
    .join("|");
    Regex::new(&pattern).unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    Variable(Reference),
    Call(Call),
    If(Condition),
    Else,
    EndIf(String),
    Begin(String),
    End(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    /// Byte offset of the token in the source.
    pub start: usize,
    /// 1-based line the token starts on.
    pub line: usize,
}

/// Counts lines forward from the last token so each byte is scanned once.
struct LineCounter<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
}

impl LineCounter<'_> {
    fn advance_to(&mut self, pos: usize) -> usize {
        self.line += self.source[self.pos..pos].matches('\n').count();
        self.pos = pos;
        self.line
    }
}

/// Splits `source` into literal text and legacy markup tokens.
///
/// Anything that does not match a known form stays literal text.
pub fn tokenize(source: &str) -> Vec<Spanned> {
    let mut tokens = Vec::new();
    let mut last_end = 0;
    let mut lines = LineCounter {
        source,
        pos: 0,
        line: 1,
    };

    for caps in MARKUP.captures_iter(source) {
        let whole = caps.get(0).unwrap();
        if whole.start() > last_end {
            tokens.push(Spanned {
                token: Token::Text(source[last_end..whole.start()].to_string()),
                start: last_end,
                line: lines.advance_to(last_end),
            });
        }
        let token = classify(&caps);
        trace!("token at {}: {:?}", whole.start(), token);
        tokens.push(Spanned {
            token,
            start: whole.start(),
            line: lines.advance_to(whole.start()),
        });
        last_end = whole.end();
    }

    if last_end < source.len() {
        tokens.push(Spanned {
            token: Token::Text(source[last_end..].to_string()),
            start: last_end,
            line: lines.advance_to(last_end),
        });
    }

    tokens
}

fn classify(caps: &Captures<'_>) -> Token {
    let text = |name: &str| caps.name(name).map_or("", |m| m.as_str());

    if let Some(name) = caps.name("call_name") {
        Token::Call(Call::parse(name.as_str(), text("call_args")))
    } else if let Some(path) = caps.name("var_path") {
        Token::Variable(Reference::new(
            caps.name("var_parent").is_some(),
            path.as_str(),
        ))
    } else if let Some(name) = caps.name("iff_name") {
        Token::If(Condition {
            negated: !text("iff_not").is_empty(),
            test: Expr::Call(Call::parse(name.as_str(), text("iff_args"))),
            source: text("iff").to_string(),
        })
    } else if let Some(path) = caps.name("if_path") {
        Token::If(Condition {
            negated: !text("if_not").is_empty(),
            test: Expr::Reference(Reference::new(
                caps.name("if_parent").is_some(),
                path.as_str(),
            )),
            source: text("if").to_string(),
        })
    } else if caps.name("else").is_some() {
        Token::Else
    } else if let Some(payload) = caps.name("endif") {
        Token::EndIf(payload.as_str().to_string())
    } else if let Some(key) = caps.name("begin") {
        Token::Begin(key.as_str().to_string())
    } else {
        Token::End(text("end").to_string())
    }
}
