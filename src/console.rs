use std::io::{self, BufRead, Write};

/// Operator answers starting with a lowercase `y` are affirmative; anything else is not.
pub fn is_affirmative(answer: &str) -> bool {
    answer.starts_with('y')
}

/// Line-oriented operator I/O.
///
/// Prompts and results go to `out`, error text to `err`. Reading past the end
/// of `input` is an error: the operator closed the stream.
pub struct Console<R, W, E> {
    input: R,
    out: W,
    err: E,
}

impl Console<io::StdinLock<'static>, io::Stdout, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout(), io::stderr())
    }
}

impl<R: BufRead, W: Write, E: Write> Console<R, W, E> {
    pub fn new(input: R, out: W, err: E) -> Self {
        Self { input, out, err }
    }

    /// Read one line without its terminator
    pub fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "operator input closed",
            ));
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    /// Print a prompt and read the answer
    pub fn ask(&mut self, prompt: &str) -> io::Result<String> {
        self.say(prompt)?;
        self.read_line()
    }

    /// Print a yes/no question and interpret the answer
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.ask(question)?;
        Ok(is_affirmative(&answer))
    }

    /// Block until the operator sends a line; its content is ignored
    pub fn wait_for_enter(&mut self) -> io::Result<()> {
        self.read_line().map(|_| ())
    }

    pub fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    /// Print without a newline so a following "done." lands on the same line
    pub fn progress(&mut self, text: &str) -> io::Result<()> {
        write!(self.out, "{text}")?;
        self.out.flush()
    }

    pub fn warn(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.err, "{text}")?;
        self.err.flush()
    }

    pub fn into_parts(self) -> (R, W, E) {
        (self.input, self.out, self.err)
    }
}
