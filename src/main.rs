use gui::App;
use iced::{Application, Settings};
use subscrape_core::CoreError;

#[tokio::main]
async fn main() -> Result<(), CoreError> {
    tracing_subscriber::fmt()
        .with_env_filter("subscrape=debug,gui=debug,reddit_client=debug")
        .init();

    tracing::info!("Starting Subscrape - Reddit top post exporter");

    let settings = Settings {
        window: iced::window::Settings {
            size: iced::Size::new(1100.0, 760.0),
            min_size: Some(iced::Size::new(800.0, 600.0)),
            ..Default::default()
        },
        ..Default::default()
    };

    SubscrapeApp::run(settings).map_err(|e| {
        tracing::error!("Application error: {}", e);
        CoreError::Internal {
            message: format!("GUI error: {e}"),
        }
    })
}

struct SubscrapeApp {
    app: App,
}

impl Application for SubscrapeApp {
    type Message = gui::Message;
    type Theme = iced::Theme;
    type Executor = iced::executor::Default;
    type Flags = ();

    fn new(_flags: Self::Flags) -> (Self, iced::Command<Self::Message>) {
        tracing::info!("Initializing application");
        (Self { app: App::new() }, iced::Command::none())
    }

    fn title(&self) -> String {
        "Subscrape - Reddit Top Posts".to_string()
    }

    fn update(&mut self, message: Self::Message) -> iced::Command<Self::Message> {
        self.app.update(message)
    }

    fn view(&self) -> iced::Element<Self::Message> {
        self.app.view()
    }
}
