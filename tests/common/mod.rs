//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Once;

use svgpipe::SvgDocument;
use svgpipe::compare::{CompareResult, compare_svg};

/// Two-layer test document, filled in by the builder methods.
pub struct TestImage {
    view_box: String,
    l1_name: String,
    l1_content: String,
    l2_name: String,
    l2_content: String,
}

impl Default for TestImage {
    fn default() -> Self {
        Self {
            view_box: "0 0 100 150".to_string(),
            l1_name: "L1".to_string(),
            l1_content: String::new(),
            l2_name: "L2".to_string(),
            l2_content: String::new(),
        }
    }
}

impl TestImage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view_box(mut self, view_box: &str) -> Self {
        self.view_box = view_box.to_string();
        self
    }

    pub fn layer1(mut self, name: &str, content: &str) -> Self {
        self.l1_name = name.to_string();
        self.l1_content = content.to_string();
        self
    }

    pub fn l1_content(mut self, content: &str) -> Self {
        self.l1_content = content.to_string();
        self
    }

    pub fn l2_content(mut self, content: &str) -> Self {
        self.l2_content = content.to_string();
        self
    }

    pub fn to_svg(&self) -> String {
        format!(
            r#"<?xml version='1.0' encoding='utf-8'?>
<svg version="1.2" baseProfile="tiny" xmlns="http://www.w3.org/2000/svg" x="0px" y="0px" width="100px" height="150px" viewBox="{}">
<g id="{}">{}</g>
<g id="{}">{}</g>
</svg>
"#,
            self.view_box, self.l1_name, self.l1_content, self.l2_name, self.l2_content
        )
    }

    pub fn document(&self) -> SvgDocument {
        SvgDocument::parse(&self.to_svg()).expect("test image is well-formed")
    }
}

/// Panic with a readable report unless `actual` matches `expected`.
#[track_caller]
pub fn assert_svg_eq(expected: &str, actual: &str) {
    match compare_svg(expected, actual) {
        CompareResult::Match => {}
        CompareResult::Mismatch { details } => {
            panic!(
                "SVG mismatch:\n{details}\n{}",
                format_inline_diff(expected, actual)
            );
        }
        CompareResult::ParseError { details } => panic!("{details}"),
    }
}

/// Inline diff of two serialized documents for assertion messages.
///
/// Removed text is shown as `[-…-]`, added text as `[+…+]`; long unchanged
/// runs are abbreviated.
pub fn format_inline_diff(expected: &str, actual: &str) -> String {
    use dissimilar::Chunk;

    let mut output = String::new();
    output.push_str("\n=== Inline Diff (expected vs actual) ===\n");
    output.push_str("Legend: [-expected only-] [+actual only+] [unchanged]\n\n");

    for chunk in dissimilar::diff(expected, actual) {
        match chunk {
            Chunk::Equal(s) => {
                let lines: Vec<&str> = s.lines().collect();
                if s.len() > 100 && lines.len() > 3 {
                    output.push_str(lines[0]);
                    output.push('\n');
                    output.push_str(&format!("... ({} unchanged lines) ...\n", lines.len() - 2));
                    output.push_str(lines[lines.len() - 1]);
                } else {
                    output.push_str(s);
                }
            }
            Chunk::Delete(s) => {
                output.push_str("[-");
                output.push_str(s);
                output.push_str("-]");
            }
            Chunk::Insert(s) => {
                output.push_str("[+");
                output.push_str(s);
                output.push_str("+]");
            }
        }
    }
    output
}

/// Route `tracing` output of the library to the test writer.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
