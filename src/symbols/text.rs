//! Lays matched symbols out as text.

/// Returned instead of text when every cell read as blank.
pub const UNREADABLE: &str = "No hidden message could be read from the image";

/// Joins a row-major grid of matched symbols into lines.
///
/// Horizontal text yields one line per row, vertical text one line per
/// column (read top to bottom). Blank cells render as spaces and every line
/// ends with a newline. When no cell matched at all, [`UNREADABLE`] is
/// returned.
#[must_use]
pub fn assemble(
    symbols: &[Option<char>],
    rows: u32,
    cols: u32,
    vertical: bool,
) -> String
{
    if symbols.iter().all(Option::is_none)
    {
        return UNREADABLE.into();
    }

    let cell = |row: u32, col: u32| {
        let index = row as usize * cols as usize + col as usize;
        symbols.get(index).copied().flatten().unwrap_or(' ')
    };

    let (lines, line_length) =
        if vertical { (cols, rows) } else { (rows, cols) };
    let mut message = String::with_capacity(symbols.len() + lines as usize);
    for line in 0..lines
    {
        for position in 0..line_length
        {
            let symbol = if vertical
            {
                cell(position, line)
            }
            else
            {
                cell(line, position)
            };
            message.push(symbol);
        }
        message.push('\n');
    }
    message
}
