//! Converts templates written for the templates.js engine (`{path}`
//! interpolation and `<!-- IF -->` / `<!-- BEGIN -->` comment markers) into
//! Go `text/template` syntax.
//!
//! ```
//! let out = tplconv::convert("<!-- BEGIN items -->{items.name}<!-- END items -->").unwrap();
//! assert_eq!(out, "{{range $i0, $i0_value := $.items}}{{(index $.items $i0).name}}{{- end}}");
//! ```

pub mod ast;
pub mod batch;
pub mod conditions;
pub mod config;
pub mod converter;
pub mod error;
pub mod function;
pub mod lexer;
pub mod loops;
pub mod naming;
pub mod parser;
pub mod path;
pub mod scope;
pub mod variables;

pub use batch::{BatchConverter, BatchError, BatchReport};
pub use config::{BatchConfig, ConfigError, JobConfig};
pub use converter::{convert, ConvertOptions, Converter};
pub use error::{ConvertError, StructuralError};
pub use function::resolve_call;
pub use naming::{NamingError, OutputNamer};
pub use path::resolve_path;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_scenarios() {
        assert_eq!(convert("{name}").unwrap(), "{{$.name}}");
        assert_eq!(convert("{items.length}").unwrap(), "{{(len $.items)}}");
        assert_eq!(
            convert("<!-- IF active --><!-- ELSE --><!-- ENDIF active -->").unwrap(),
            "{{if $.active}}{{- else}}{{- end}}"
        );
        assert_eq!(
            convert("<!-- BEGIN items -->{@index}: {items.name}<!-- END items -->").unwrap(),
            "{{range $i0, $i0_value := $.items}}{{$i0}}: {{(index $.items $i0).name}}{{- end}}"
        );
        assert_eq!(
            convert("<!-- BEGIN items -->{@index}: {name}<!-- END items -->").unwrap(),
            "{{range $i0, $i0_value := $.items}}{{$i0}}: {{$.name}}{{- end}}"
        );
    }

    #[test]
    fn test_one_range_per_loop() {
        let source = "<!-- BEGIN a -->\
            <!-- BEGIN a.b --><!-- BEGIN a.b.c -->{@index}<!-- END a.b.c --><!-- END a.b -->\
            <!-- END a -->\
            <!-- BEGIN d -->{@index}<!-- END d -->";
        let out = convert(source).unwrap();
        assert_eq!(out.matches("{{range ").count(), 4);
        assert_eq!(out.matches("{{- end}}").count(), 4);
        assert!(!out.contains("BEGIN"));
        for name in ["$i0,", "$i1,", "$i2,"] {
            assert!(out.contains(name), "missing {}", name);
        }
        assert!(!out.contains("$i3"));
    }

    #[test]
    fn test_inner_index_binds_to_inner_loop() {
        let out = convert(
            "<!-- BEGIN rows --><!-- BEGIN rows.cells -->{@index}<!-- END rows.cells --><!-- END rows -->",
        )
        .unwrap();
        assert!(out.contains("{{$i1}}"));
        assert!(!out.contains("{{$i0}}"));
    }

    #[test]
    fn test_rejection() {
        let err = convert("<!-- BEGIN a -->{{a.b}}<!-- END a -->").unwrap_err();
        assert_eq!(
            err,
            ConvertError::UnsupportedSyntax {
                snippet: "{{a.b}}".to_string(),
                line: 1,
            }
        );
    }
}
