// apps/cli/src/commands.rs
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use booking_cell::{AppointmentViews, Booking, BookingError, BookingOrchestrator, BookingService, PaymentHandoff};
use messaging_cell::{MessageService, MessagingError, UnreadPoller};
use payment_cell::{ConfirmationDetails, PaymentError, PaymentHistory, PaymentInitiator, PaymentMethod};
use shared_config::AppConfig;
use shared_models::{AppError, Redirect, Session, UserIdentity, UserRole};
use shared_utils::{FileSessionStore, SessionContext};
use slot_cell::{DateRange, SlotDisplay, SlotError, SlotRepositoryClient};

#[derive(Parser)]
#[command(name = "therapy", about = "Book therapy sessions from the terminal", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store a session token issued by the backend
    Login {
        #[arg(long)]
        token: String,
        #[arg(long)]
        user_id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, value_enum, default_value_t = RoleArg::Patient)]
        role: RoleArg,
    },
    /// Forget the stored session
    Logout,
    /// Show who is logged in
    Whoami,
    /// List therapists and their slots for a week
    Slots {
        /// First day to show (YYYY-MM-DD, default today)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Only show this day
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Book a slot and optionally pay for it
    Book {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        therapist: i64,
        #[arg(long)]
        slot: i64,
        /// M-Pesa number to charge, e.g. 0712345678
        #[arg(long, conflicts_with = "card")]
        phone: Option<String>,
        /// Pay by card
        #[arg(long)]
        card: bool,
    },
    /// List your bookings
    Bookings {
        #[arg(long)]
        upcoming: bool,
        /// List every booking with this therapist instead
        #[arg(long, conflicts_with = "upcoming")]
        therapist: Option<i64>,
    },
    /// Cancel one of your bookings
    Cancel { booking_id: i64 },
    /// Delete a booking record
    Delete { booking_id: i64 },
    /// Show payments recorded for a booking
    Payments { booking_id: i64 },
    /// Show unread messages
    Unread {
        /// Keep polling until interrupted
        #[arg(long)]
        watch: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Patient,
    Therapist,
    Admin,
}

impl From<RoleArg> for UserRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Patient => UserRole::Patient,
            RoleArg::Therapist => UserRole::Therapist,
            RoleArg::Admin => UserRole::Admin,
        }
    }
}

pub async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let session = SessionContext::new(Arc::new(FileSessionStore::new(config.session_file.clone())));

    match cli.command {
        Commands::Login { token, user_id, name, email, role } => {
            let identity = UserIdentity {
                id: user_id,
                name,
                email,
                role: role.into(),
            };
            session
                .login(&Session::new(token, identity))
                .context("failed to store session")?;
            println!("Logged in as user {}", user_id);
        }
        Commands::Logout => {
            session.logout().context("failed to clear session")?;
            println!("Logged out");
        }
        Commands::Whoami => match session.current() {
            Some(s) => println!("{} (id {}, {})", s.user.name, s.user.id, s.user.role),
            None => println!("Not logged in"),
        },
        Commands::Slots { from, date } => show_slots(&config, session, from, date).await?,
        Commands::Book { date, therapist, slot, phone, card } => {
            let handoff = book(&config, session.clone(), date, therapist, slot).await?;
            let method = match (phone, card) {
                (_, true) => Some(PaymentMethod::Card),
                (Some(phone), false) => Some(PaymentMethod::MobileMoney { phone }),
                (None, false) => None,
            };

            match method {
                Some(method) => {
                    let confirmation = pay(&config, session, &handoff, method).await?;
                    print_confirmation(&confirmation);
                }
                None => println!(
                    "Booking {} created. Pay {:.0} to confirm it.",
                    handoff.booking_id, handoff.session_fee
                ),
            }
        }
        Commands::Bookings { upcoming, therapist } => {
            let bookings = match therapist {
                Some(id) => BookingService::new(&config, session).list_bookings(Some(id)).await?,
                None if upcoming => AppointmentViews::new(&config, session).upcoming().await?,
                None => AppointmentViews::new(&config, session).my_bookings().await?,
            };
            print_bookings(&bookings, SlotDisplay::new(config.slot_display_day_offset));
        }
        Commands::Cancel { booking_id } => {
            let views = AppointmentViews::new(&config, session);
            let booking = views
                .my_bookings()
                .await?
                .into_iter()
                .find(|b| b.id == booking_id)
                .with_context(|| format!("booking {} not found", booking_id))?;
            let cancelled = views.cancel(&booking).await?;
            println!("Booking {} is now {}", cancelled.id, cancelled.booking_status);
        }
        Commands::Delete { booking_id } => {
            BookingService::new(&config, session).delete_booking(booking_id).await?;
            println!("Booking {} deleted", booking_id);
        }
        Commands::Payments { booking_id } => {
            let payments = PaymentHistory::new(&config, session)
                .payments_for_booking(booking_id)
                .await?;
            if payments.is_empty() {
                println!("No payments recorded for booking {}", booking_id);
            }
            for p in payments {
                println!(
                    "#{} {:.0} {:?} {}",
                    p.id,
                    p.amount,
                    p.status,
                    p.mpesa_receipt_number.as_deref().unwrap_or("-")
                );
            }
        }
        Commands::Unread { watch } => unread(&config, session, watch).await?,
    }

    Ok(())
}

async fn show_slots(
    config: &AppConfig,
    session: SessionContext,
    from: Option<NaiveDate>,
    date: Option<NaiveDate>,
) -> Result<()> {
    let start = from.or(date).unwrap_or_else(|| Local::now().date_naive());
    let directory = SlotRepositoryClient::new(config, session)
        .fetch_directory(DateRange::week_from(start))
        .await?;
    let display = SlotDisplay::new(config.slot_display_day_offset);
    let now = Local::now().naive_local();

    if directory.is_empty() {
        println!("No slots available from {}", start);
        return Ok(());
    }

    for schedule in directory.schedules() {
        let t = &schedule.therapist;
        println!(
            "[{}] {} - {} ({} yrs), fee {:.0}",
            t.id, t.name, t.specialization, t.experience, t.session_fee
        );
        for slot in schedule.slots.iter().filter(|s| date.map_or(true, |d| s.date == d)) {
            let marker = if slot.is_booked {
                "booked"
            } else if slot.is_past(now) {
                "past"
            } else {
                "open"
            };
            println!("    slot {:>5}  {}  [{}]", slot.id, display.format_slot(slot), marker);
        }
    }
    Ok(())
}

async fn book(
    config: &AppConfig,
    session: SessionContext,
    date: NaiveDate,
    therapist_id: i64,
    slot_id: i64,
) -> Result<PaymentHandoff> {
    let mut flow = BookingOrchestrator::new(config, session, DateRange::week_from(date));
    flow.refresh().await?;
    flow.expand_therapist(therapist_id)?;
    flow.select_slot(slot_id)?;

    let handoff = flow.submit().await?;
    info!("Booked slot {} as booking {}", slot_id, handoff.booking_id);
    Ok(handoff)
}

async fn pay(
    config: &AppConfig,
    session: SessionContext,
    handoff: &PaymentHandoff,
    method: PaymentMethod,
) -> Result<ConfirmationDetails> {
    let mut initiator = PaymentInitiator::new(config, session);
    let pending = initiator.initiate(handoff, method).await?;

    println!(
        "Payment request sent (checkout {}). Check your phone to complete the payment.",
        pending.checkout_request_id()
    );
    Ok(pending.wait().await?)
}

async fn unread(config: &AppConfig, session: SessionContext, watch: bool) -> Result<()> {
    let user = session.require()?;
    let service = MessageService::new(config, session);

    if !watch {
        println!("{} unread messages", service.unread_count(user.user_id()).await?);
        return Ok(());
    }

    let mut poller = UnreadPoller::new(service);
    let mut updates = poller.subscribe();
    poller.start(config.unread_poll_interval());

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    bail!("unread poller stopped");
                }
                println!("{} unread messages", *updates.borrow());
            }
            _ = tokio::signal::ctrl_c() => {
                poller.stop();
                return Ok(());
            }
        }
    }
}

fn print_confirmation(confirmation: &ConfirmationDetails) {
    println!("Booking confirmed");
    println!("  booking:   {}", confirmation.booking_id);
    println!("  therapist: {}", confirmation.therapist.name);
    println!("  slot:      {}", confirmation.slot);
    println!("  fee:       {:.0}", confirmation.session_fee);
    println!("  checkout:  {}", confirmation.checkout_request_id);
}

fn print_bookings(bookings: &[Booking], display: SlotDisplay) {
    if bookings.is_empty() {
        println!("No bookings");
        return;
    }
    for b in bookings {
        let when = b
            .slot
            .as_ref()
            .map(|s| display.format_slot(s))
            .unwrap_or_else(|| format!("slot {}", b.slot_id));
        println!("#{} {} with therapist {} [{}]", b.id, when, b.therapist_id, b.booking_status);
    }
}

/// True when the failure should send the user to log in.
pub fn needs_login(err: &anyhow::Error) -> bool {
    let redirect = if let Some(e) = err.downcast_ref::<BookingError>() {
        e.redirect()
    } else if let Some(e) = err.downcast_ref::<PaymentError>() {
        e.redirect()
    } else if let Some(e) = err.downcast_ref::<SlotError>() {
        e.redirect()
    } else if let Some(e) = err.downcast_ref::<MessagingError>() {
        e.redirect()
    } else if let Some(e) = err.downcast_ref::<AppError>() {
        e.redirect()
    } else {
        None
    };
    redirect == Some(Redirect::Login)
}
