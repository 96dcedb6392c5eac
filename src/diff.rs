//! Diff generation for previewing changes.
//!
//! Previews compare class outlines (see [`crate::model::outline`]) before and
//! after an operation, one unified diff per changed class.

use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};

use crate::model::outline::class_outline;
use crate::model::{ClassId, Workspace};

/// Generates a unified diff between two strings.
pub fn unified_diff(original: &str, modified: &str, path: &Path) -> String {
    let diff = TextDiff::from_lines(original, modified);
    let mut output = String::new();

    output.push_str(&format!("--- a/{}\n", path.display()));
    output.push_str(&format!("+++ b/{}\n", path.display()));

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            output.push('\n');
        }

        for op in group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => "-",
                    ChangeTag::Insert => "+",
                    ChangeTag::Equal => " ",
                };

                output.push_str(sign);
                output.push_str(change.value());
            }
        }
    }

    output
}

/// Represents a summary of changes.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DiffSummary {
    pub classes_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffSummary {
    /// Creates a summary from original and modified content.
    pub fn from_diff(original: &str, modified: &str) -> Self {
        let diff = TextDiff::from_lines(original, modified);
        let mut insertions = 0;
        let mut deletions = 0;

        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => insertions += 1,
                ChangeTag::Delete => deletions += 1,
                ChangeTag::Equal => {}
            }
        }

        Self {
            classes_changed: usize::from(insertions > 0 || deletions > 0),
            insertions,
            deletions,
        }
    }

    /// Combines two summaries.
    pub fn merge(&mut self, other: &DiffSummary) {
        self.classes_changed += other.classes_changed;
        self.insertions += other.insertions;
        self.deletions += other.deletions;
    }
}

impl std::fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} class(es) changed, {} insertions(+), {} deletions(-)",
            self.classes_changed, self.insertions, self.deletions
        )
    }
}

/// Colorized diff output for terminal display.
pub fn colorized_diff(original: &str, modified: &str, path: &Path) -> String {
    let diff = TextDiff::from_lines(original, modified);
    let mut output = String::new();

    // ANSI color codes
    const RED: &str = "\x1b[31m";
    const GREEN: &str = "\x1b[32m";
    const CYAN: &str = "\x1b[36m";
    const RESET: &str = "\x1b[0m";

    output.push_str(&format!("{}--- a/{}{}\n", CYAN, path.display(), RESET));
    output.push_str(&format!("{}+++ b/{}{}\n", CYAN, path.display(), RESET));

    for group in diff.grouped_ops(3).iter() {
        for op in group {
            for change in diff.iter_changes(op) {
                let (sign, color) = match change.tag() {
                    ChangeTag::Delete => ("-", RED),
                    ChangeTag::Insert => ("+", GREEN),
                    ChangeTag::Equal => (" ", ""),
                };

                if color.is_empty() {
                    output.push_str(&format!("{}{}", sign, change.value()));
                } else {
                    output.push_str(&format!("{}{}{}{}", color, sign, change.value(), RESET));
                }
            }
        }
    }

    output
}

/// The outline change of one class.
#[derive(Debug, Clone)]
pub struct ClassChange {
    pub class: ClassId,
    /// The declaring file, or `<Name>.java` for classes built in memory.
    pub path: PathBuf,
    pub original: String,
    pub modified: String,
}

impl ClassChange {
    pub fn unified(&self) -> String {
        unified_diff(&self.original, &self.modified, &self.path)
    }

    pub fn colorized(&self) -> String {
        colorized_diff(&self.original, &self.modified, &self.path)
    }
}

/// Outline changes between two states of the same workspace.
///
/// Classes only present in `after` are compared against an empty outline.
pub fn outline_changes(before: &Workspace, after: &Workspace) -> Vec<ClassChange> {
    after
        .classes()
        .filter_map(|(id, decl)| {
            let original = if id.0 < before.len() {
                class_outline(before, id)
            } else {
                String::new()
            };
            let modified = class_outline(after, id);
            (original != modified).then(|| ClassChange {
                class: id,
                path: decl
                    .file
                    .clone()
                    .unwrap_or_else(|| decl.directory.join(format!("{}.java", decl.name))),
                original,
                modified,
            })
        })
        .collect()
}

/// Summary over a set of class changes.
pub fn summarize(changes: &[ClassChange]) -> DiffSummary {
    let mut summary = DiffSummary::default();
    for change in changes {
        summary.merge(&DiffSummary::from_diff(&change.original, &change.modified));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassDecl, JavaType, MethodDecl};

    #[test]
    fn test_unified_diff() {
        let diff = unified_diff("a\nb\n", "a\nc\n", Path::new("Dog.java"));
        assert!(diff.starts_with("--- a/Dog.java\n+++ b/Dog.java\n"));
        assert!(diff.contains("-b\n"));
        assert!(diff.contains("+c\n"));
    }

    #[test]
    fn test_colorized_diff() {
        let diff = colorized_diff("a\nb\n", "a\nc\n", Path::new("Dog.java"));
        assert!(diff.starts_with("\x1b[36m--- a/Dog.java\x1b[0m\n\x1b[36m+++ b/Dog.java\x1b[0m\n"));
        assert!(diff.contains(" a\n"));
        assert!(diff.contains("\x1b[31m-b\n\x1b[0m"));
        assert!(diff.contains("\x1b[32m+c\n\x1b[0m"));
    }

    #[test]
    fn test_summary() {
        let summary = DiffSummary::from_diff("a\nb\n", "a\nc\nd\n");
        assert_eq!(summary.insertions, 2);
        assert_eq!(summary.deletions, 1);
        assert_eq!(
            summary.to_string(),
            "1 class(es) changed, 2 insertions(+), 1 deletions(-)"
        );
        assert_eq!(DiffSummary::from_diff("a\n", "a\n").classes_changed, 0);
    }

    #[test]
    fn test_outline_changes_only_lists_changed_classes() {
        let mut before = Workspace::new();
        let animal = before.add_class(ClassDecl::class("Animal").in_directory("zoo"));
        before.add_class(
            ClassDecl::class("Dog")
                .extends(JavaType::class("Animal"))
                .in_directory("zoo"),
        );

        let mut after = before.clone();
        after.add_method(animal, MethodDecl::new("bark").public().abstract_method());
        after.add_class(ClassDecl::interface("Pet").in_directory("zoo"));

        let changes = outline_changes(&before, &after);
        let paths: Vec<_> = changes.iter().map(|c| c.path.clone()).collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("zoo/Animal.java"), PathBuf::from("zoo/Pet.java")]
        );
        assert!(changes[0].unified().contains("+    public abstract void bark();"));
        assert_eq!(changes[1].original, "");
        assert_eq!(summarize(&changes).classes_changed, 2);
    }
}
