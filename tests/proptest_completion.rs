//! Property tests for completion cursor handling

use nbinterp::interpreter::shell::completion_prefix;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prefix_never_panics(buf in "\\PC{0,40}", cursor in 0usize..200) {
        let _ = completion_prefix(&buf, cursor);
    }

    #[test]
    fn prefix_is_suffix_of_text_before_cursor(buf in "[a-z ;|é]{0,30}", cursor in 0usize..64) {
        let prefix = completion_prefix(&buf, cursor);
        let mut end = cursor.min(buf.len());
        while !buf.is_char_boundary(end) {
            end -= 1;
        }
        prop_assert!(buf[..end].ends_with(prefix));
        prop_assert!(!prefix.contains(' '));
        prop_assert!(!prefix.contains(';'));
    }
}
