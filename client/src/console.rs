use crate::app::{Notice, RepoManager};
use crate::errors::ClientError;
use crate::listing::RepoSource;
use crate::relay_client::VisibilityRelay;
use shared::protocol::AccessToken;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const HELP: &str = "\
commands:
  user <name>         set the GitHub username
  token <token>       set the personal access token
  fetch               fetch the current page
  next | prev         change page
  toggle <n|name>     select or deselect a repository
  toggle #<name>      select or deselect by exact name
  private | public    choose the visibility to apply
  submit              update the selected repositories
  list                show the current page
  help                show this help
  quit                exit";

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    User(&'a str),
    Token(&'a str),
    Fetch,
    Next,
    Prev,
    Toggle(&'a str),
    Visibility(bool),
    Submit,
    List,
    Help,
    Quit,
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        let (word, arg) = match line.split_once(char::is_whitespace) {
            Some((word, arg)) => (word, arg.trim()),
            None => (line, ""),
        };

        let command = match (word, arg) {
            ("user", name) if !name.is_empty() => Command::User(name),
            ("token", token) if !token.is_empty() => Command::Token(token),
            ("fetch", "") => Command::Fetch,
            ("next", "") => Command::Next,
            ("prev", "") => Command::Prev,
            ("toggle", target) if !target.is_empty() => Command::Toggle(target),
            ("private", "") => Command::Visibility(true),
            ("public", "") => Command::Visibility(false),
            ("submit", "") => Command::Submit,
            ("list", "") => Command::List,
            ("help", "") => Command::Help,
            ("quit" | "exit", "") => Command::Quit,
            _ => return None,
        };
        Some(command)
    }
}

/// Line-oriented front end for a [`RepoManager`].
pub struct Console<S, R, I, O> {
    manager: RepoManager<S, R>,
    input: I,
    output: O,
}

impl<S, R, I, O> Console<S, R, I, O>
where
    S: RepoSource,
    R: VisibilityRelay,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    pub fn new(manager: RepoManager<S, R>, input: I, output: O) -> Self {
        Console {
            manager,
            input,
            output,
        }
    }

    pub fn into_parts(self) -> (RepoManager<S, R>, O) {
        (self.manager, self.output)
    }

    /// Process commands until `quit` or end of input.
    pub async fn run(&mut self) -> Result<(), ClientError> {
        self.write(HELP).await?;

        if self.manager.credential().is_complete() {
            let notice = self.manager.refresh().await;
            self.report(notice).await?;
        }

        let mut line = String::new();
        loop {
            self.output.write_all(b"> ").await?;
            self.output.flush().await?;

            line.clear();
            if self.input.read_line(&mut line).await? == 0 {
                break;
            }

            let Some(command) = Command::parse(&line) else {
                if !line.trim().is_empty() {
                    self.write("unknown command, type `help`").await?;
                }
                continue;
            };

            if command == Command::Quit {
                break;
            }
            self.execute(command).await?;
        }

        self.output.flush().await?;
        Ok(())
    }

    async fn execute(&mut self, command: Command<'_>) -> Result<(), ClientError> {
        match command {
            Command::User(name) => self.manager.set_username(name),
            Command::Token(token) => self.manager.set_token(AccessToken::new(token)),
            Command::Fetch => {
                let notice = self.manager.refresh().await;
                self.report(notice).await?;
            }
            Command::Next => match self.manager.next_page().await {
                Some(notice) => self.report(notice).await?,
                None => self.write("already on the last page").await?,
            },
            Command::Prev => match self.manager.previous_page().await {
                Some(notice) => self.report(notice).await?,
                None => self.write("already on the first page").await?,
            },
            Command::Toggle(target) => {
                let name = self.resolve(target);
                let selected = self.manager.toggle(&name);
                let verb = if selected { "selected" } else { "deselected" };
                self.write(&format!("{verb} {name}")).await?;
            }
            Command::Visibility(make_private) => {
                self.manager.set_make_private(make_private);
                self.write(&format!("visibility: {}", visibility(make_private)))
                    .await?;
            }
            Command::Submit => match self.manager.submit_update().await {
                Ok(notice) => self.write(&notice.to_string()).await?,
                Err(errors) => {
                    for error in errors {
                        self.write(&error.to_string()).await?;
                    }
                }
            },
            Command::List => self.render().await?,
            Command::Help => self.write(HELP).await?,
            Command::Quit => {}
        }
        Ok(())
    }

    /// `#name` is always a name. Otherwise a 1-based index into the visible
    /// page wins over a name.
    fn resolve(&self, target: &str) -> String {
        if let Some(name) = target.strip_prefix('#') {
            return name.to_string();
        }
        target
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.manager.repos().get(i))
            .cloned()
            .unwrap_or_else(|| target.to_string())
    }

    /// Show a notice if there is one, otherwise the refreshed page.
    async fn report(&mut self, notice: Option<Notice>) -> Result<(), ClientError> {
        match notice {
            Some(notice) => self.write(&notice.to_string()).await,
            None => self.render().await,
        }
    }

    async fn render(&mut self) -> Result<(), ClientError> {
        let mut out = String::new();

        if self.manager.repos().is_empty() {
            out.push_str("No repositories found\n");
        } else {
            for (i, repo) in self.manager.repos().iter().enumerate() {
                let mark = if self.manager.selection().contains(repo) {
                    'x'
                } else {
                    ' '
                };
                out.push_str(&format!("[{mark}] {:>2}. {repo}\n", i + 1));
            }
            out.push_str(&format!("{}\n", self.manager.pagination()));
        }

        out.push_str(&format!(
            "selected: {}, visibility: {}",
            self.manager.selection().len(),
            visibility(self.manager.make_private())
        ));
        self.write(&out).await
    }

    async fn write(&mut self, text: &str) -> Result<(), ClientError> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        Ok(())
    }
}

fn visibility(make_private: bool) -> &'static str {
    if make_private { "private" } else { "public" }
}
