//! Circulation CLI - loan tracking and fine management for a library
//!
//! This is the command-line interface for Circulation. It adapts user
//! commands into calls on the core service and renders the typed results.

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use uuid::Uuid;

use circulation_core::model::{FineSummary, Loan};
use circulation_core::{CirculationService, MemoryStore, VERSION};

/// Circulation - loan tracking and fine management for a library
#[derive(Parser)]
#[command(name = "circulation")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the library file
    #[arg(short, long, global = true, env = "CIRCULATION_LIBRARY")]
    library: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new empty library
    Init {
        /// Path where the library will be created
        #[arg(value_name = "PATH")]
        path: Option<String>,
    },

    /// Add a book to the catalog
    AddBook {
        /// ISBN (catalog key)
        #[arg(value_name = "ISBN")]
        isbn: String,

        /// Title
        #[arg(value_name = "TITLE")]
        title: String,

        /// Author name (repeatable)
        #[arg(short, long, value_name = "AUTHOR")]
        author: Vec<String>,
    },

    /// Register a borrower and print their card id
    Register {
        /// Full name
        #[arg(value_name = "NAME")]
        name: String,

        /// Contact email
        #[arg(value_name = "EMAIL")]
        email: String,
    },

    /// Check out one or more books to a borrower
    Checkout {
        /// Borrower card id
        #[arg(value_name = "CARD")]
        card: String,

        /// ISBNs to check out
        #[arg(value_name = "ISBN", required = true)]
        isbns: Vec<String>,
    },

    /// Check a book back in
    Checkin {
        /// Borrower card id
        #[arg(value_name = "CARD")]
        card: String,

        /// ISBN being returned
        #[arg(value_name = "ISBN")]
        isbn: String,
    },

    /// Settle the fine on a loan
    PayFine {
        /// Loan id
        #[arg(value_name = "LOAN_ID")]
        loan_id: String,
    },

    /// Refresh fines on all outstanding overdue loans
    UpdateFines,

    /// Show fines, for one borrower or the whole library
    Fines {
        /// Borrower card id (omit for all fines)
        #[arg(long, value_name = "CARD")]
        card: Option<String>,

        /// Only show fines not yet paid
        #[arg(long)]
        unpaid_only: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List a borrower's loans
    Loans {
        /// Borrower card id
        #[arg(value_name = "CARD")]
        card: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search the catalog by isbn, title, or author
    Search {
        /// Search query
        #[arg(value_name = "QUERY")]
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { path }) => {
            let target = path.or(cli.library).ok_or_else(|| {
                anyhow::anyhow!("No library path provided. Use --library or pass a path.")
            })?;
            let target = PathBuf::from(target);
            if target.exists() {
                return Err(anyhow::anyhow!(
                    "Library already exists at {}",
                    target.display()
                ));
            }
            MemoryStore::new().save(&target)?;
            if !cli.quiet {
                println!("Initialized new library at {}", target.display());
            }
        }
        Some(Commands::AddBook {
            isbn,
            title,
            author,
        }) => {
            let path = library_path(cli.library)?;
            let mut service = open_service(&path)?;
            let book = service.add_book(&isbn, &title, author)?;
            service.into_store().save(&path)?;
            if !cli.quiet {
                println!("Catalogued {} ({})", book.title, book.isbn);
            }
        }
        Some(Commands::Register { name, email }) => {
            let path = library_path(cli.library)?;
            let mut service = open_service(&path)?;
            let borrower = service.register_borrower(&name, &email)?;
            service.into_store().save(&path)?;
            if cli.quiet {
                println!("{}", borrower.card_id);
            } else {
                println!("Registered borrower {}", borrower.card_id);
            }
        }
        Some(Commands::Checkout { card, isbns }) => {
            let path = library_path(cli.library)?;
            let mut service = open_service(&path)?;
            let loans = service.checkout(&isbns, &card, Utc::now())?;
            service.into_store().save(&path)?;
            if !cli.quiet {
                for loan in &loans {
                    println!(
                        "Checked out {} (loan {}, due {})",
                        loan.isbn,
                        loan.id,
                        loan.due_date.format("%Y-%m-%d")
                    );
                }
            }
        }
        Some(Commands::Checkin { card, isbn }) => {
            let path = library_path(cli.library)?;
            let mut service = open_service(&path)?;
            let loan = service.checkin(&isbn, &card, Utc::now())?;
            service.into_store().save(&path)?;
            if !cli.quiet {
                match &loan.fine {
                    Some(fine) => println!(
                        "Checked in {} - overdue, fine {}",
                        loan.isbn,
                        format_cents(fine.amount_cents)
                    ),
                    None => println!("Checked in {}", loan.isbn),
                }
            }
        }
        Some(Commands::PayFine { loan_id }) => {
            let parsed = Uuid::parse_str(&loan_id)
                .map_err(|e| anyhow::anyhow!("Invalid loan id: {}", e))?;
            let path = library_path(cli.library)?;
            let mut service = open_service(&path)?;
            let loan = service.pay_fine(parsed)?;
            service.into_store().save(&path)?;
            if !cli.quiet {
                if let Some(fine) = &loan.fine {
                    println!("Paid {} on loan {}", format_cents(fine.amount_cents), loan.id);
                }
            }
        }
        Some(Commands::UpdateFines) => {
            let path = library_path(cli.library)?;
            let mut service = open_service(&path)?;
            let updated = service.update_fines(Utc::now())?;
            service.into_store().save(&path)?;
            if !cli.quiet {
                println!("Updated fines on {} loan(s)", updated);
            }
        }
        Some(Commands::Fines {
            card,
            unpaid_only,
            json,
        }) => {
            let path = library_path(cli.library)?;
            let service = open_service(&path)?;
            match card {
                Some(card) => {
                    let mut report = service.fine_report(&card)?;
                    if unpaid_only {
                        report.fines.retain(|fine| !fine.paid);
                    }
                    if json {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    } else {
                        print_fine_lines(&report.fines, cli.quiet);
                        println!("Total due: {}", format_cents(report.total_due_cents));
                    }
                }
                None => {
                    let mut fines = service.all_fines()?;
                    if unpaid_only {
                        fines.retain(|fine| !fine.paid);
                    }
                    if json {
                        println!("{}", serde_json::to_string_pretty(&fines)?);
                    } else {
                        print_fine_lines(&fines, cli.quiet);
                    }
                }
            }
        }
        Some(Commands::Loans { card, json }) => {
            let path = library_path(cli.library)?;
            let service = open_service(&path)?;
            let loans = service.loans_for_borrower(&card)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&loans)?);
            } else {
                if !cli.quiet {
                    println!("LOAN_ID | ISBN | OUT | DUE | IN | FINE");
                }
                for loan in &loans {
                    println!("{}", loan_line(loan));
                }
            }
        }
        Some(Commands::Search { query, json }) => {
            let path = library_path(cli.library)?;
            let service = open_service(&path)?;
            let books = service.search_books(&query)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&books)?);
            } else {
                if !cli.quiet {
                    println!("ISBN | TITLE | AUTHORS | AVAILABLE");
                }
                for book in &books {
                    println!(
                        "{} | {} | {} | {}",
                        book.isbn,
                        book.title,
                        book.authors.join("; "),
                        if book.available { "yes" } else { "no" }
                    );
                }
            }
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "circulation", &mut std::io::stdout());
        }
        None => {
            println!("Circulation v{}", VERSION);
            println!("\nRun `circulation --help` for usage information.");
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn library_path(library: Option<String>) -> anyhow::Result<PathBuf> {
    library.map(PathBuf::from).ok_or_else(|| {
        anyhow::anyhow!("No library path provided. Use --library or CIRCULATION_LIBRARY.")
    })
}

fn open_service(path: &Path) -> anyhow::Result<CirculationService<MemoryStore>> {
    let store = MemoryStore::load(path)?;
    Ok(CirculationService::new(store))
}

fn format_cents(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

fn print_fine_lines(fines: &[FineSummary], quiet: bool) {
    if !quiet {
        println!("LOAN_ID | CARD_ID | AMOUNT | PAID");
    }
    for fine in fines {
        println!(
            "{} | {} | {} | {}",
            fine.loan_id,
            fine.card_id,
            format_cents(fine.amount_cents),
            if fine.paid { "yes" } else { "no" }
        );
    }
}

fn loan_line(loan: &Loan) -> String {
    let date_in = loan
        .date_in
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    let fine = loan
        .fine
        .as_ref()
        .map(|fine| {
            format!(
                "{} ({})",
                format_cents(fine.amount_cents),
                if fine.paid { "paid" } else { "unpaid" }
            )
        })
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{} | {} | {} | {} | {} | {}",
        loan.id,
        loan.isbn,
        loan.date_out.format("%Y-%m-%d"),
        loan.due_date.format("%Y-%m-%d"),
        date_in,
        fine
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(0), "$0.00");
        assert_eq!(format_cents(25), "$0.25");
        assert_eq!(format_cents(350), "$3.50");
        assert_eq!(format_cents(1405), "$14.05");
    }
}
