//! CarParter CLI - terminal client for the CarParter car-center marketplace
//!
//! Chat with car centers, track repairs and quotes, and browse centers on a map.

mod api;
mod auth;
mod config;
mod live;
mod mock;
mod models;
mod tui;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::models::{
    CarCenterRegistration, CarCenterUpdate, CenterSearch, CsInquiryForm, DuplicateField,
    EstimateForm, EstimateItemForm, QuoteRequestForm, ReservationForm, ReviewForm,
    ReviewReplyForm, ReviewReportForm,
};

#[derive(Parser)]
#[command(name = "carparter")]
#[command(about = "Terminal client for the CarParter car-center marketplace", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the configured API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a bearer token issued by the CarParter login page
    Login {
        /// JWT access token
        #[arg(short, long)]
        token: String,
    },

    /// Remove the stored token
    Logout,

    /// Show current authentication status
    Status,

    /// Show my user profile
    Whoami,

    /// List my chat rooms
    Rooms,

    /// Open (or reuse) the chat room for a center and estimate
    OpenRoom {
        /// Car center ID
        #[arg(short, long)]
        center: String,

        /// Estimate the conversation is about
        #[arg(short, long)]
        estimate: i64,
    },

    /// Print the message history of a room
    History {
        /// Room ID (from `rooms` output)
        room_id: String,
    },

    /// List completed repairs
    Repairs {
        /// List the logged-in car center's repairs instead of mine
        #[arg(long)]
        center: bool,
    },

    /// Show one repair
    Repair { id: i64 },

    /// Mark a repair as completed
    Complete { id: i64 },

    /// Delete a completed repair
    DeleteRepair { id: i64 },

    /// List my registered vehicles
    Vehicles,

    /// Search car centers
    Centers {
        #[arg(short, long)]
        keyword: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        district: Option<String>,

        #[arg(long)]
        sort: Option<String>,
    },

    /// Show my open quote request, or create / delete one
    Quote {
        #[command(subcommand)]
        action: Option<QuoteAction>,
    },

    /// Accept an estimate for my quote request
    Accept { estimate_id: i64 },

    /// Quote requests and sent estimates (car centers)
    Estimates {
        #[command(subcommand)]
        action: Option<EstimateAction>,
    },

    /// Reservations (car centers)
    Reservations {
        #[command(subcommand)]
        action: Option<ReservationAction>,
    },

    /// My car center's profile and registration
    Center {
        #[command(subcommand)]
        action: CenterAction,
    },

    /// Used parts: my listings, or a search across centers
    Parts {
        #[command(subcommand)]
        action: Option<PartsAction>,
    },

    /// List reviews of a center, or my own
    Reviews {
        #[arg(short, long)]
        center: Option<String>,

        /// Reviews my car center received
        #[arg(long, conflicts_with = "center")]
        received: bool,
    },

    /// Write, edit or delete one of my reviews
    Review {
        #[command(subcommand)]
        action: ReviewAction,
    },

    /// Answer a review as a car center
    Reply {
        #[command(subcommand)]
        action: ReplyAction,
    },

    /// Report an abusive review to the admins
    Report {
        review_id: i64,

        #[arg(short, long)]
        reason: String,

        content: String,
    },

    /// Customer-service inquiries
    Cs {
        #[command(subcommand)]
        action: Option<CsAction>,
    },

    /// Ask the help chatbot
    Ask { message: String },

    /// List notifications, or mark one as read
    Notifications {
        #[arg(long)]
        read: Option<i64>,
    },

    /// Launch the terminal user interface
    Tui {
        /// Use in-memory sample chats instead of the backend
        #[arg(long)]
        mock: bool,
    },
}

#[derive(Subcommand)]
enum QuoteAction {
    /// Request quotes for one of my vehicles
    Create {
        /// Vehicle ID (from `vehicles` output)
        #[arg(long)]
        car: i64,

        #[arg(short, long)]
        details: String,

        #[arg(short, long)]
        address: String,

        #[arg(long, requires = "lng")]
        lat: Option<f64>,

        #[arg(long, requires = "lat")]
        lng: Option<f64>,
    },

    /// Withdraw a quote request
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum EstimateAction {
    /// Send an estimate for a quote request
    Submit(EstimateArgs),

    /// Show one estimate with its items
    Show { id: i64 },

    /// Replace an estimate
    Edit {
        id: i64,
        #[command(flatten)]
        form: EstimateArgs,
    },

    /// Delete an estimate
    Rm { id: i64 },
}

#[derive(Args)]
struct EstimateArgs {
    /// Quote request ID
    #[arg(long)]
    request: i64,

    /// Total cost in won
    #[arg(long)]
    cost: i64,

    #[arg(short, long, default_value = "")]
    details: String,

    /// NAME:PRICE:HOURS:TYPE, repeatable
    #[arg(long = "item")]
    items: Vec<EstimateItemForm>,
}

impl From<EstimateArgs> for EstimateForm {
    fn from(args: EstimateArgs) -> Self {
        Self {
            request_id: args.request,
            estimated_cost: args.cost,
            details: args.details,
            estimate_items: args.items,
        }
    }
}

#[derive(Subcommand)]
enum ReservationAction {
    /// Book a customer in
    Add(ReservationArgs),

    /// Replace a reservation
    Edit {
        id: i64,
        #[command(flatten)]
        form: ReservationArgs,
    },

    /// Cancel a reservation
    Rm { id: i64 },
}

#[derive(Args)]
struct ReservationArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    phone: String,

    /// Vehicle description, e.g. "쏘나타 12가3456"
    #[arg(long)]
    car: String,

    /// ISO date-time, e.g. 2025-08-01T10:00:00
    #[arg(long)]
    date: String,

    #[arg(short, long)]
    details: Option<String>,
}

impl From<ReservationArgs> for ReservationForm {
    fn from(args: ReservationArgs) -> Self {
        Self {
            customer_name: args.name,
            customer_phone: args.phone,
            car_info: args.car,
            reservation_date: args.date,
            request_details: args.details,
        }
    }
}

#[derive(Subcommand)]
enum CenterAction {
    /// Sign up a new car center
    Register(RegisterArgs),

    /// Show my car center
    Info,

    /// Show any car center
    Show { id: String },

    /// Change my center's details
    Update(CenterUpdateArgs),

    /// Check whether a login ID (or business number) is taken
    Check {
        #[arg(long)]
        business_number: bool,

        value: String,
    },

    /// Delete a car center account
    Delete { id: String },
}

#[derive(Args)]
struct RegisterArgs {
    /// Login ID
    #[arg(long)]
    id: String,

    #[arg(long)]
    password: String,

    #[arg(long)]
    name: String,

    #[arg(long)]
    address: String,

    #[arg(long)]
    phone: String,

    #[arg(long)]
    business_number: String,

    #[arg(long)]
    hours: String,

    #[arg(long)]
    description: Option<String>,
}

impl From<RegisterArgs> for CarCenterRegistration {
    fn from(args: RegisterArgs) -> Self {
        Self {
            center_id: args.id,
            password: args.password,
            center_name: args.name,
            address: args.address,
            phone_number: args.phone,
            business_registration_number: args.business_number,
            opening_hours: args.hours,
            description: args.description,
        }
    }
}

#[derive(Args)]
struct CenterUpdateArgs {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    address: Option<String>,

    #[arg(long)]
    phone: Option<String>,

    #[arg(long)]
    hours: Option<String>,

    #[arg(long)]
    description: Option<String>,
}

impl From<CenterUpdateArgs> for CarCenterUpdate {
    fn from(args: CenterUpdateArgs) -> Self {
        Self {
            center_name: args.name,
            address: args.address,
            phone_number: args.phone,
            opening_hours: args.hours,
            description: args.description,
        }
    }
}

#[derive(Subcommand)]
enum PartsAction {
    /// Show one part
    Show { id: i64 },

    /// Remove one of my listings
    Rm { id: i64 },

    /// Search all centers' parts by name
    Search { query: String },
}

#[derive(Subcommand)]
enum ReviewAction {
    Show { id: i64 },

    /// Review a center
    Add(ReviewArgs),

    /// Replace one of my reviews
    Edit {
        id: i64,
        #[command(flatten)]
        form: ReviewArgs,
    },

    Rm { id: i64 },
}

#[derive(Args)]
struct ReviewArgs {
    #[arg(short, long)]
    center: String,

    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
    rating: u8,

    /// Completed repair the review is about
    #[arg(long)]
    repair: Option<i64>,

    content: String,
}

impl From<ReviewArgs> for ReviewForm {
    fn from(args: ReviewArgs) -> Self {
        Self {
            center_id: args.center,
            rating: args.rating,
            content: args.content,
            repair_id: args.repair,
        }
    }
}

#[derive(Subcommand)]
enum ReplyAction {
    Add { review_id: i64, content: String },

    Edit {
        reply_id: i64,

        /// Review the reply belongs to
        #[arg(long)]
        review: i64,

        content: String,
    },

    Rm { reply_id: i64 },
}

#[derive(Subcommand)]
enum CsAction {
    /// Send a new inquiry
    Ask {
        #[arg(short, long)]
        title: String,

        content: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter =
        || tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    // The TUI owns the terminal, so its logs go to the in-app log pane.
    if let Commands::Tui { mock } = cli.command {
        let log_sink = tui::LogSink::new();
        tracing_subscriber::registry()
            .with(env_filter())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(log_sink.clone()),
            )
            .init();

        return tui::run(tui::TuiOptions {
            mock,
            base_url: cli.base_url,
            log_sink,
        })
        .await;
    }

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let client = || api::connect(cli.base_url.as_deref());

    match cli.command {
        Commands::Login { token } => {
            auth::login(&token).await?;
        }
        Commands::Logout => {
            auth::logout().await?;
        }
        Commands::Status => {
            auth::status().await?;
        }
        Commands::Whoami => api::show_profile(&client()?).await?,
        Commands::Rooms => {
            tracing::info!("Fetching chat rooms...");
            api::list_rooms(&client()?).await?;
        }
        Commands::OpenRoom { center, estimate } => {
            api::open_room(&client()?, &center, estimate).await?;
        }
        Commands::History { room_id } => api::show_history(&client()?, &room_id).await?,
        Commands::Repairs { center } => api::list_repairs(&client()?, center).await?,
        Commands::Repair { id } => api::show_repair(&client()?, id).await?,
        Commands::Complete { id } => api::complete_repair(&client()?, id).await?,
        Commands::DeleteRepair { id } => api::delete_repair(&client()?, id).await?,
        Commands::Vehicles => api::list_vehicles(&client()?).await?,
        Commands::Centers {
            keyword,
            category,
            district,
            sort,
        } => {
            let filters = CenterSearch {
                category,
                district,
                keyword,
                sort,
            };
            api::search_centers(&client()?, &filters).await?;
        }
        Commands::Quote { action } => {
            let client = client()?;
            match action {
                None => api::show_quote_request(&client).await?,
                Some(QuoteAction::Create {
                    car,
                    details,
                    address,
                    lat,
                    lng,
                }) => {
                    let form = QuoteRequestForm {
                        user_car_id: car,
                        request_details: details,
                        address,
                        latitude: lat,
                        longitude: lng,
                    };
                    api::create_quote_request(&client, &form).await?;
                }
                Some(QuoteAction::Delete { id }) => api::delete_quote_request(&client, id).await?,
            }
        }
        Commands::Accept { estimate_id } => api::accept_estimate(&client()?, estimate_id).await?,
        Commands::Estimates { action } => {
            let client = client()?;
            match action {
                None => api::list_estimates(&client).await?,
                Some(EstimateAction::Submit(form)) => {
                    api::save_estimate(&client, None, &form.into()).await?
                }
                Some(EstimateAction::Show { id }) => api::show_estimate(&client, id).await?,
                Some(EstimateAction::Edit { id, form }) => {
                    api::save_estimate(&client, Some(id), &form.into()).await?
                }
                Some(EstimateAction::Rm { id }) => api::delete_estimate(&client, id).await?,
            }
        }
        Commands::Reservations { action } => {
            let client = client()?;
            match action {
                None => api::list_reservations(&client).await?,
                Some(ReservationAction::Add(form)) => {
                    api::save_reservation(&client, None, &form.into()).await?
                }
                Some(ReservationAction::Edit { id, form }) => {
                    api::save_reservation(&client, Some(id), &form.into()).await?
                }
                Some(ReservationAction::Rm { id }) => api::delete_reservation(&client, id).await?,
            }
        }
        Commands::Center { action } => {
            let client = client()?;
            match action {
                CenterAction::Register(form) => api::register_center(&client, &form.into()).await?,
                CenterAction::Info => api::show_center(&client, None).await?,
                CenterAction::Show { id } => api::show_center(&client, Some(id.as_str())).await?,
                CenterAction::Update(update) => api::update_center(&client, &update.into()).await?,
                CenterAction::Check {
                    business_number,
                    value,
                } => {
                    let field = if business_number {
                        DuplicateField::BusinessNumber
                    } else {
                        DuplicateField::Id
                    };
                    api::check_duplicate(&client, field, &value).await?;
                }
                CenterAction::Delete { id } => api::delete_center(&client, &id).await?,
            }
        }
        Commands::Parts { action } => {
            let client = client()?;
            match action {
                None => api::list_parts(&client, None).await?,
                Some(PartsAction::Show { id }) => api::show_part(&client, id).await?,
                Some(PartsAction::Rm { id }) => api::delete_part(&client, id).await?,
                Some(PartsAction::Search { query }) => {
                    api::list_parts(&client, Some(query.as_str())).await?
                }
            }
        }
        Commands::Reviews { center, received } => {
            api::list_reviews(&client()?, center.as_deref(), received).await?
        }
        Commands::Review { action } => {
            let client = client()?;
            match action {
                ReviewAction::Show { id } => api::show_review(&client, id).await?,
                ReviewAction::Add(form) => api::save_review(&client, None, &form.into()).await?,
                ReviewAction::Edit { id, form } => {
                    api::save_review(&client, Some(id), &form.into()).await?
                }
                ReviewAction::Rm { id } => api::delete_review(&client, id).await?,
            }
        }
        Commands::Reply { action } => {
            let client = client()?;
            match action {
                ReplyAction::Add { review_id, content } => {
                    let form = ReviewReplyForm { review_id, content };
                    api::save_reply(&client, None, &form).await?;
                }
                ReplyAction::Edit {
                    reply_id,
                    review,
                    content,
                } => {
                    let form = ReviewReplyForm {
                        review_id: review,
                        content,
                    };
                    api::save_reply(&client, Some(reply_id), &form).await?;
                }
                ReplyAction::Rm { reply_id } => api::delete_reply(&client, reply_id).await?,
            }
        }
        Commands::Report {
            review_id,
            reason,
            content,
        } => {
            let form = ReviewReportForm {
                review_id,
                reason,
                content,
            };
            api::report_review(&client()?, &form).await?;
        }
        Commands::Cs { action: None } => api::list_cs_inquiries(&client()?).await?,
        Commands::Cs {
            action: Some(CsAction::Ask { title, content }),
        } => {
            let form = CsInquiryForm {
                title,
                question_content: content,
            };
            api::ask_cs(&client()?, &form).await?;
        }
        Commands::Ask { message } => {
            api::ask_chatbot(&message).await?;
        }
        Commands::Notifications { read: Some(id) } => {
            api::mark_notification_read(&client()?, id).await?;
        }
        Commands::Notifications { read: None } => api::list_notifications(&client()?).await?,
        Commands::Tui { .. } => {}
    }

    Ok(())
}
