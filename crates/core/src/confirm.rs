use std::io::BufRead;

use crate::error::{ResizeError, Result};

pub const CONFIRMATION_TOKEN: &str = "proceed";

/// Reads one line and accepts it only if it is exactly [`CONFIRMATION_TOKEN`].
/// End of input and read errors count as a refusal.
pub fn read_confirmation(input: &mut dyn BufRead) -> Result<()> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => return Err(ResizeError::UserAbort),
        Ok(_) => {}
    }
    let answer = line
        .strip_suffix('\n')
        .map(|rest| rest.strip_suffix('\r').unwrap_or(rest))
        .unwrap_or(&line);
    if answer == CONFIRMATION_TOKEN {
        Ok(())
    } else {
        Err(ResizeError::UserAbort)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::read_confirmation;
    use crate::error::ResizeError;

    fn answer(text: &str) -> bool {
        read_confirmation(&mut Cursor::new(text.as_bytes())).is_ok()
    }

    #[test]
    fn only_exact_token_is_accepted() {
        assert!(answer("proceed\n"));
        assert!(answer("proceed\r\n"));
        assert!(answer("proceed"));
    }

    #[test]
    fn anything_else_aborts() {
        for text in ["", "\n", "yes\n", "y\n", "Proceed\n", " proceed\n", "proceed \n", "proceed!\n"] {
            assert!(!answer(text), "{text:?} should abort");
        }
    }

    #[test]
    fn refusal_is_user_abort() {
        let err = read_confirmation(&mut Cursor::new(b"no\n".to_vec())).expect_err("aborts");
        assert!(matches!(err, ResizeError::UserAbort));
    }
}
