//! Bounded numeric input for menu prompts.

use std::io::{self, BufRead, Write};

use tracing::{error, info, warn};

/// Asks for an integer in `min..=max` until a valid one is entered.
///
/// Rejected input is explained on `out` and logged. Returns `None` when
/// `input` reaches end of file.
pub fn prompt_number<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    prompt: &str,
    min: u32,
    max: u32,
) -> io::Result<Option<u32>> {
    loop {
        write!(out, "{}", prompt)?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(None);
        }

        match line.trim().parse::<i64>() {
            Ok(value) if value < i64::from(min) => {
                writeln!(out, "Value must be greater than or equal to {}.", min)?;
                warn!("Rejected input {}: below minimum {}", value, min);
            }
            Ok(value) if value > i64::from(max) => {
                writeln!(out, "Value must be less than or equal to {}.", max)?;
                warn!("Rejected input {}: above maximum {}", value, max);
            }
            Ok(value) => {
                info!("User entered value {}", value);
                // Bounds were checked above.
                return Ok(Some(value as u32));
            }
            Err(_) => {
                writeln!(out, "Invalid input, try again.")?;
                error!("Rejected input: not an integer");
            }
        }
    }
}
