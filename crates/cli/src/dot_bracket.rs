use rnalayout_core::Partners;

/// Parse dot-bracket notation into a 1-indexed partners table.
///
/// Characters: `(` = open pair, `)` = close pair, `.` = unpaired. Whitespace
/// is skipped.
///
/// Returns Err on invalid input (bad characters, unmatched brackets).
pub fn parse(input: &str) -> Result<Partners, String> {
    let mut table: Vec<usize> = Vec::new();
    let mut stack: Vec<usize> = Vec::new();

    for (i, ch) in input.chars().filter(|c| !c.is_whitespace()).enumerate() {
        let position = i + 1;
        match ch {
            '(' => {
                table.push(0);
                stack.push(position);
            }
            ')' => {
                let open = stack
                    .pop()
                    .ok_or_else(|| format!("unmatched ) at position {position}"))?;
                table.push(open);
                table[open - 1] = position;
            }
            '.' => table.push(0),
            _ => return Err(format!("bad dot-bracket character {ch:?} at position {position}")),
        }
    }

    if let Some(open) = stack.pop() {
        return Err(format!("unmatched ( at position {open}"));
    }
    Ok(Partners::new(table))
}

/// Parse a comma-separated partners table such as `4,3,0,0`.
pub fn parse_table(input: &str) -> Result<Partners, String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|e| format!("bad partner {s:?}: {e}"))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Partners::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_pair() {
        let pt = parse("()").unwrap();
        assert_eq!(pt.as_slice(), &[2, 1]);
    }

    #[test]
    fn test_nested() {
        let pt = parse("(((...)))").unwrap();
        assert_eq!(pt.as_slice(), &[9, 8, 7, 0, 0, 0, 3, 2, 1]);
    }

    #[test]
    fn test_whitespace_skipped() {
        let pt = parse("((..)) ..\n").unwrap();
        assert_eq!(pt.as_slice(), &[6, 5, 0, 0, 2, 1, 0, 0]);
    }

    #[test]
    fn test_unmatched_open() {
        assert!(parse("((..)").is_err());
    }

    #[test]
    fn test_unmatched_close() {
        assert!(parse("())").is_err());
    }

    #[test]
    fn test_bad_char() {
        assert!(parse("(x)").is_err());
    }

    #[test]
    fn test_table() {
        let pt = parse_table("4, 3,2,1").unwrap();
        assert_eq!(pt.as_slice(), &[4, 3, 2, 1]);
        assert!(parse_table("4,x").is_err());
    }
}
