use crate::blogger::Blog;
use crate::error::{GblogError, Result};
use async_trait::async_trait;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

static ACTIVE_PROMPTS: AtomicUsize = AtomicUsize::new(0);

/// Whether a blog prompt is waiting for an answer. Ctrl-C belongs to the
/// prompt while this holds and interrupts the run otherwise.
pub fn prompt_active() -> bool {
    ACTIVE_PROMPTS.load(Ordering::SeqCst) > 0
}

struct PromptGuard;

impl PromptGuard {
    fn enter() -> Self {
        ACTIVE_PROMPTS.fetch_add(1, Ordering::SeqCst);
        PromptGuard
    }
}

impl Drop for PromptGuard {
    fn drop(&mut self) {
        ACTIVE_PROMPTS.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One answer to the blog selection prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionLine {
    Line(String),
    /// Ctrl-C while waiting; treated like an invalid answer
    Interrupted,
    /// No more input will ever arrive
    Closed,
}

#[async_trait]
pub trait SelectionInput {
    async fn read_selection(&mut self) -> SelectionLine;
}

/// Reads answers from the terminal
pub struct StdinSelection {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinSelection {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinSelection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SelectionInput for StdinSelection {
    async fn read_selection(&mut self) -> SelectionLine {
        tokio::select! {
            line = self.lines.next_line() => match line {
                Ok(Some(line)) => SelectionLine::Line(line),
                Ok(None) => SelectionLine::Closed,
                Err(e) => {
                    tracing::debug!("Failed to read selection: {}", e);
                    SelectionLine::Closed
                }
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                SelectionLine::Interrupted
            }
        }
    }
}

/// Ask the user to pick one of several blogs by its 1-based number,
/// asking again until the answer is valid.
pub async fn choose_blog<'a, I>(blogs: &'a [Blog], input: &mut I) -> Result<&'a Blog>
where
    I: SelectionInput + ?Sized + Send,
{
    let _guard = PromptGuard::enter();

    println!("\nAvailable blogs:");
    for (i, blog) in blogs.iter().enumerate() {
        println!("{}. {} - {} (ID: {})", i + 1, blog.name, blog.url, blog.id);
    }

    loop {
        print!("\nSelect blog number: ");
        std::io::stdout().flush().ok();

        match input.read_selection().await {
            SelectionLine::Line(answer) => {
                if let Some(blog) = parse_choice(&answer, blogs.len()).map(|i| &blogs[i]) {
                    return Ok(blog);
                }
            }
            SelectionLine::Interrupted => {}
            SelectionLine::Closed => return Err(GblogError::SelectionAborted),
        }
        println!("Invalid selection. Please try again.");
    }
}

/// Zero-based index for a valid 1-based answer
fn parse_choice(answer: &str, count: usize) -> Option<usize> {
    match answer.trim().parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Some(n - 1),
        _ => None,
    }
}
