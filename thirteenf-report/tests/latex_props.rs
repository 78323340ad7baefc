//! Property tests for the Markdown to LaTeX conversion.

use proptest::prelude::*;
use thirteenf_report::reporting::markdown_to_latex;

fn arb_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("---".to_string()),
        "[a-z ]{1,12}".prop_map(|t| format!("# {t}")),
        "[a-z ]{1,12}".prop_map(|t| format!("## {t}")),
        "[a-z ]{1,12}".prop_map(|t| format!("- {t}")),
        "[a-z ]{1,12}".prop_map(|t| format!("- *{t}*")),
        "[a-z][a-z ]{0,20}",
    ]
}

proptest! {
    #[test]
    fn itemize_environments_are_balanced(lines in prop::collection::vec(arb_line(), 0..30)) {
        let tex = markdown_to_latex(&lines.join("\n"));
        let opened = tex.matches("\\begin{itemize}").count();
        let closed = tex.matches("\\end{itemize}").count();
        prop_assert_eq!(opened, closed);

        // never nested: every begin is followed by its end before the next begin
        let mut depth = 0i32;
        for line in tex.lines() {
            if line == "\\begin{itemize}" {
                depth += 1;
            } else if line == "\\end{itemize}" {
                depth -= 1;
            }
            prop_assert!((0..=1).contains(&depth));
        }
    }

    #[test]
    fn bullets_become_items(lines in prop::collection::vec(arb_line(), 0..30)) {
        let tex = markdown_to_latex(&lines.join("\n"));
        let bullets = lines.iter().filter(|l| l.starts_with("- ")).count();
        prop_assert_eq!(tex.matches("\\item ").count(), bullets);
    }
}
