use chrono::Utc;
use iced::widget::{button, column, container, row, scrollable, text, text_input, Column};
use iced::{Command, Element, Length, Theme};
use reddit_client::RedditClient;
use subscrape_core::{export, ErrorExt, PostRecord, RedditCredentials};
use tracing::info;

const TITLE_DISPLAY_CHARS: usize = 60;

#[derive(Debug, Clone)]
pub enum Message {
    ClientIdChanged(String),
    ClientSecretChanged(String),
    UserAgentChanged(String),
    SubredditChanged(String),
    FetchPressed,
    FetchFinished(Result<Vec<PostRecord>, String>),
    SaveCsvPressed,
    CsvSaved(Result<String, String>),
}

#[derive(Debug)]
enum Stage {
    Idle,
    Fetching {
        subreddit: String,
    },
    Loaded {
        subreddit: String,
        posts: Vec<PostRecord>,
    },
    Empty,
    Failed(String),
}

pub struct App {
    client_id: String,
    client_secret: String,
    user_agent: String,
    subreddit: String,
    stage: Stage,
    csv_notice: Option<String>,
}

impl App {
    pub fn new() -> Self {
        let defaults = RedditCredentials::from_env();
        Self {
            client_id: defaults.client_id,
            client_secret: defaults.client_secret,
            user_agent: defaults.user_agent,
            subreddit: "fitness".to_string(),
            stage: Stage::Idle,
            csv_notice: None,
        }
    }

    pub fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::ClientIdChanged(value) => {
                self.client_id = value;
                Command::none()
            }
            Message::ClientSecretChanged(value) => {
                self.client_secret = value;
                Command::none()
            }
            Message::UserAgentChanged(value) => {
                self.user_agent = value;
                Command::none()
            }
            Message::SubredditChanged(value) => {
                self.subreddit = value;
                Command::none()
            }
            Message::FetchPressed => self.start_fetch(),
            Message::FetchFinished(result) => {
                let fetched = match &self.stage {
                    Stage::Fetching { subreddit } => subreddit.clone(),
                    _ => self.subreddit.trim().to_string(),
                };
                self.stage = match result {
                    Ok(posts) if posts.is_empty() => Stage::Empty,
                    Ok(posts) => Stage::Loaded {
                        subreddit: fetched,
                        posts,
                    },
                    Err(message) => Stage::Failed(message),
                };
                Command::none()
            }
            Message::SaveCsvPressed => {
                if let Stage::Loaded { subreddit, posts } = &self.stage {
                    let filename = export::export_filename(subreddit);
                    return Command::perform(
                        save_csv(filename, posts.clone()),
                        Message::CsvSaved,
                    );
                }
                Command::none()
            }
            Message::CsvSaved(result) => {
                self.csv_notice = Some(match result {
                    Ok(path) => format!("Saved {}", path),
                    Err(message) => message,
                });
                Command::none()
            }
        }
    }

    fn start_fetch(&mut self) -> Command<Message> {
        self.csv_notice = None;

        let credentials = RedditCredentials::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            self.user_agent.clone(),
        );
        if let Err(e) = credentials.validate() {
            self.stage = Stage::Failed(e.user_friendly_message());
            return Command::none();
        }

        let subreddit = self.subreddit.trim().to_string();
        info!("Fetching top posts for r/{}", subreddit);
        self.stage = Stage::Fetching {
            subreddit: subreddit.clone(),
        };

        Command::perform(fetch_posts(credentials, subreddit), Message::FetchFinished)
    }

    pub fn view(&self) -> Element<Message, Theme> {
        row![
            container(self.credentials_form())
                .width(Length::Fixed(300.0))
                .padding(20),
            container(self.results_panel())
                .width(Length::Fill)
                .height(Length::Fill)
                .padding(20),
        ]
        .spacing(10)
        .into()
    }

    fn credentials_form(&self) -> Element<Message, Theme> {
        column![
            text("Reddit API Credentials").size(18),
            text_input("Client ID", &self.client_id)
                .on_input(Message::ClientIdChanged)
                .secure(true)
                .padding(8),
            text_input("Client Secret", &self.client_secret)
                .on_input(Message::ClientSecretChanged)
                .secure(true)
                .padding(8),
            text_input("User Agent", &self.user_agent)
                .on_input(Message::UserAgentChanged)
                .padding(8),
            text("Subreddit (without r/)").size(14),
            text_input("fitness", &self.subreddit)
                .on_input(Message::SubredditChanged)
                .padding(8),
            self.fetch_button(),
        ]
        .spacing(10)
        .into()
    }

    fn fetch_button(&self) -> Element<Message, Theme> {
        if matches!(self.stage, Stage::Fetching { .. }) {
            button("Fetching...").into()
        } else {
            button("Fetch posts").on_press(Message::FetchPressed).into()
        }
    }

    fn results_panel(&self) -> Element<Message, Theme> {
        match &self.stage {
            Stage::Idle => column![
                text("Reddit Subreddit Scraper").size(24),
                text("Fetch the top 100 posts from the last 6 months of any subreddit.").size(14),
            ]
            .spacing(10)
            .into(),
            Stage::Fetching { subreddit } => {
                column![text(format!("Fetching top posts from r/{}...", subreddit)).size(16)]
                    .into()
            }
            Stage::Empty => {
                column![text("No posts found in the last 6 months.").size(16)].into()
            }
            Stage::Failed(message) => column![
                text("Something went wrong").size(18),
                text(message).size(14),
            ]
            .spacing(10)
            .into(),
            Stage::Loaded { subreddit, posts } => {
                let header = row![
                    text("Title").size(14).width(Length::FillPortion(5)),
                    text("Author").size(14).width(Length::FillPortion(2)),
                    text("Posted").size(14).width(Length::FillPortion(2)),
                    text("Score").size(14).width(Length::FillPortion(1)),
                    text("Comments").size(14).width(Length::FillPortion(1)),
                ]
                .spacing(10);

                let mut rows = Column::new().spacing(4);
                for post in posts {
                    rows = rows.push(post_row(post));
                }

                let mut panel = column![
                    text(format!("Scraped {} posts from r/{}", posts.len(), subreddit)).size(16),
                    header,
                    scrollable(rows).height(Length::Fill),
                    button("Save CSV").on_press(Message::SaveCsvPressed),
                ]
                .spacing(10);

                if let Some(notice) = &self.csv_notice {
                    panel = panel.push(text(notice).size(12));
                }

                panel.into()
            }
        }
    }
}

fn post_row(post: &PostRecord) -> Element<Message, Theme> {
    row![
        text(truncate_title(&post.title))
            .size(13)
            .width(Length::FillPortion(5)),
        text(&post.author).size(13).width(Length::FillPortion(2)),
        text(post.created_at.format("%Y-%m-%d").to_string())
            .size(13)
            .width(Length::FillPortion(2)),
        text(post.score.to_string())
            .size(13)
            .width(Length::FillPortion(1)),
        text(post.comment_count.to_string())
            .size(13)
            .width(Length::FillPortion(1)),
    ]
    .spacing(10)
    .into()
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > TITLE_DISPLAY_CHARS {
        let cut: String = title.chars().take(TITLE_DISPLAY_CHARS).collect();
        format!("{}...", cut)
    } else {
        title.to_string()
    }
}

async fn fetch_posts(
    credentials: RedditCredentials,
    subreddit: String,
) -> Result<Vec<PostRecord>, String> {
    let client = RedditClient::new(credentials);
    client
        .fetch_top_posts(&subreddit, Utc::now())
        .await
        .map_err(|e| {
            e.log_error();
            e.user_friendly_message()
        })
}

async fn save_csv(filename: String, posts: Vec<PostRecord>) -> Result<String, String> {
    info!("Writing {} records to {}", posts.len(), filename);
    export::write_csv(&filename, &posts)
        .map(|()| filename)
        .map_err(|e| {
            e.log_error();
            e.user_friendly_message()
        })
}

#[cfg(test)]
mod tests {
    use super::truncate_title;

    #[test]
    fn test_short_titles_pass_through() {
        assert_eq!(truncate_title("Hello"), "Hello");
    }

    #[test]
    fn test_long_titles_are_cut_on_char_boundaries() {
        let long = "é".repeat(80);
        let shown = truncate_title(&long);
        assert_eq!(shown.chars().count(), 63);
        assert!(shown.ends_with("..."));
    }
}
