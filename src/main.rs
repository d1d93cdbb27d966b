use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value, json};

use teamboard_client::actions;
use teamboard_client::api::ApiClient;
use teamboard_client::app::App;
use teamboard_client::builder::ActionError;
use teamboard_client::model::{Color, Position};
use teamboard_client::socket::{ConnectionError, SyncClient};
use teamboard_client::storage::SessionStorage;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("not logged in; run `teamboard-client login` first")]
    NotLoggedIn,
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("invalid color: {0}")]
    InvalidColor(#[from] teamboard_client::model::ParseColorError),
    #[error("output failed: {0}")]
    Output(#[from] serde_json::Error),
    #[error("signal handling failed: {0}")]
    Signal(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "teamboard", about = "Teamboard API and realtime sync CLI")]
struct Cli {
    #[arg(long, env = "TEAMBOARD_API_URL", default_value = "http://127.0.0.1:9002/api")]
    api_url: String,

    #[arg(long, env = "TEAMBOARD_SOCKET_URL", default_value = "ws://127.0.0.1:9002")]
    socket_url: String,

    #[arg(long, env = "TEAMBOARD_DATA_DIR", default_value = ".teamboard")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in with credentials and persist the session.
    Login { email: String, password: String },
    /// Join a board as a guest.
    LoginGuest { board_id: String, username: String },
    /// End the session locally and on the server.
    Logout,
    /// Show the stored session.
    Whoami,
    Board(BoardCommand),
    Ticket(TicketCommand),
    /// Connect the realtime channel and stream board changes until ctrl-c.
    Watch,
}

#[derive(Args, Debug)]
struct BoardCommand {
    #[command(subcommand)]
    command: BoardSubcommand,
}

#[derive(Subcommand, Debug)]
enum BoardSubcommand {
    List,
    Create {
        #[arg(long, default_value = "Untitled Board")]
        name: String,
    },
    Edit {
        board_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        background: Option<String>,
    },
    Remove {
        board_id: String,
    },
}

#[derive(Args, Debug)]
struct TicketCommand {
    #[command(subcommand)]
    command: TicketSubcommand,
}

#[derive(Subcommand, Debug)]
enum TicketSubcommand {
    List {
        board_id: String,
    },
    Create {
        board_id: String,
        #[arg(long)]
        content: String,
        #[arg(long, default_value = "yellow")]
        color: String,
        #[arg(long, default_value_t = 0.0)]
        x: f64,
        #[arg(long, default_value_t = 0.0)]
        y: f64,
    },
    Edit {
        board_id: String,
        ticket_id: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        x: Option<f64>,
        #[arg(long)]
        y: Option<f64>,
    },
    Remove {
        board_id: String,
        ticket_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let app = App::new(SessionStorage::new(cli.data_dir));
    let api = ApiClient::new(cli.api_url);

    match cli.command {
        Command::Login { email, password } => {
            actions::login(&app, &api, &email, &password).await?;
            print_session(&app)
        }
        Command::LoginGuest { board_id, username } => {
            actions::login_guest(&app, &api, &board_id, &username).await?;
            print_session(&app)
        }
        Command::Logout => {
            actions::logout(&app, &api).await?;
            println!("logged out");
            Ok(())
        }
        Command::Whoami => print_session(&app),
        Command::Board(board) => run_board(&app, &api, board).await,
        Command::Ticket(ticket) => run_ticket(&app, &api, ticket).await,
        Command::Watch => run_watch(&app, &api, &cli.socket_url).await,
    }
}

async fn run_board(app: &Arc<App>, api: &ApiClient, board: BoardCommand) -> Result<(), CliError> {
    match board.command {
        BoardSubcommand::List => {
            actions::load_boards(app, api).await?;
            print_json(&serde_json::to_value(app.boards.boards())?)
        }
        BoardSubcommand::Create { name } => {
            actions::add_board(app, api, &name).await?;
            print_json(&serde_json::to_value(app.boards.boards())?)
        }
        BoardSubcommand::Edit { board_id, name, background } => {
            let mut attrs = Map::new();
            if let Some(name) = name {
                attrs.insert("name".to_owned(), Value::String(name));
            }
            if let Some(background) = background {
                attrs.insert("background".to_owned(), Value::String(background));
            }
            actions::edit_board(app, api, &board_id, Value::Object(attrs)).await?;
            print_json(&serde_json::to_value(app.boards.board(&board_id))?)
        }
        BoardSubcommand::Remove { board_id } => {
            actions::remove_board(app, api, &board_id).await?;
            println!("removed {board_id}");
            Ok(())
        }
    }
}

async fn run_ticket(app: &Arc<App>, api: &ApiClient, ticket: TicketCommand) -> Result<(), CliError> {
    match ticket.command {
        TicketSubcommand::List { board_id } => {
            actions::load_tickets(app, api, &board_id).await?;
            print_json(&serde_json::to_value(app.tickets.tickets(&board_id))?)
        }
        TicketSubcommand::Create { board_id, content, color, x, y } => {
            let color: Color = color.parse()?;
            actions::add_ticket(app, api, &board_id, &content, color, Position { x, y }).await?;
            print_json(&serde_json::to_value(app.tickets.tickets(&board_id))?)
        }
        TicketSubcommand::Edit { board_id, ticket_id, content, color, x, y } => {
            let mut attrs = Map::new();
            if let Some(content) = content {
                attrs.insert("content".to_owned(), Value::String(content));
            }
            if let Some(color) = color {
                let color: Color = color.parse()?;
                attrs.insert("color".to_owned(), serde_json::to_value(color)?);
            }
            if let (Some(x), Some(y)) = (x, y) {
                attrs.insert("position".to_owned(), json!({ "x": x, "y": y }));
            }
            actions::edit_ticket(app, api, &board_id, &ticket_id, Value::Object(attrs)).await?;
            print_json(&serde_json::to_value(app.tickets.ticket(&board_id, &ticket_id))?)
        }
        TicketSubcommand::Remove { board_id, ticket_id } => {
            actions::remove_ticket(app, api, &board_id, &ticket_id).await?;
            println!("removed {ticket_id}");
            Ok(())
        }
    }
}

/// Loads boards, connects the socket, and echoes every dispatched action
/// until interrupted. Boards joined later (by other actions) are picked up
/// by the reconciliation listener automatically.
async fn run_watch(app: &Arc<App>, api: &ApiClient, socket_url: &str) -> Result<(), CliError> {
    let token = app.auth.token().ok_or(CliError::NotLoggedIn)?;

    app.dispatcher().register(|action| {
        println!("{} {}", action.kind, action.payload);
    });

    actions::load_boards(app, api).await?;
    let sync = SyncClient::new(app.clone(), socket_url);
    sync.connect(&token).await?;

    for board in app.boards.boards() {
        actions::load_tickets(app, api, &board.id).await?;
    }

    tokio::signal::ctrl_c().await?;
    sync.disconnect();
    Ok(())
}

fn print_session(app: &App) -> Result<(), CliError> {
    match (app.auth.user(), app.auth.token()) {
        (Some(user), Some(_)) => print_json(&serde_json::to_value(user)?),
        _ => {
            println!("not logged in");
            Ok(())
        }
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
