use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "ye" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Ask until the answer is recognizable. An empty line or end of input
/// picks `default`.
pub fn query_yes_no<R, W>(question: &str, default: Answer, input: &mut R, out: &mut W) -> io::Result<bool>
where
    R: BufRead,
    W: Write,
{
    let hint = match default {
        Answer::Yes => " [Y/n] ",
        Answer::No => " [y/N] ",
    };

    loop {
        write!(out, "{question}{hint}")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 || line.trim().is_empty() {
            return Ok(default == Answer::Yes);
        }
        match parse_answer(&line) {
            Some(answer) => return Ok(answer),
            None => writeln!(out, "Please respond with 'yes' or 'no' (or 'y' or 'n').")?,
        }
    }
}
