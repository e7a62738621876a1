use crate::domain::{FileDiff, Line, LineType};

/// Keeps only added lines with visible content, dropping hunks and files left empty.
pub fn retain_added_lines(files: &mut Vec<FileDiff>) {
    for file in files.iter_mut() {
        for hunk in file.hunks.iter_mut() {
            hunk.lines.retain(is_visible_addition);
        }
        file.hunks.retain(|hunk| !hunk.lines.is_empty());
    }
    files.retain(|file| !file.hunks.is_empty());
}

fn is_visible_addition(line: &Line) -> bool {
    line.kind == LineType::Added && !line.content.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::diff::parser::parse_diff;

    #[test]
    fn test_keeps_only_added_content() {
        let diff = "--- a/a.txt
+++ b/a.txt
@@ -1,3 +1,4 @@
 context
-removed
+added
+   \t
 tail
--- a/b.txt
+++ b/b.txt
@@ -1,2 +1,1 @@
 only
-deletions
";
        let mut files = parse_diff(diff).unwrap();
        assert_eq!(files.len(), 2);

        retain_added_lines(&mut files);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path(), "a.txt");

        let lines: Vec<_> = files[0].lines().collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].content, "added");
        assert_eq!(lines[0].kind, LineType::Added);
        assert_eq!(lines[0].lnum_new, 2);
        assert_eq!(lines[0].lnum_diff, 3);
    }

    #[test]
    fn test_drops_empty_hunks_but_keeps_order() {
        let diff = "--- a/a.txt
+++ b/a.txt
@@ -1,1 +1,2 @@
 x
+one
@@ -5,1 +6,1 @@
-gone
+
@@ -9,0 +10,1 @@
+two
";
        let mut files = parse_diff(diff).unwrap();
        retain_added_lines(&mut files);
        let hunks = &files[0].hunks;
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].lines[0].content, "one");
        assert_eq!(hunks[1].lines[0].content, "two");
    }
}
