use chrono::Utc;
use clap::Parser;
use place_archive::adapters::LoggingSink;
use place_archive::config::cli::Command;
use place_archive::utils::logger;
use place_archive::{
    CatalogError, CatalogService, CategoryFilter, CliConfig, MutationOutcome, NewPlace,
    NewReview, PlaceFilter, PlaceId, RestRecordStore, ReviewId, ReviewPatch, Result,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let (settings, logging) = match cli.resolve() {
        Ok(resolved) => resolved,
        Err(e) => {
            logger::init_cli_logger(cli.verbose);
            fail(&e);
        }
    };

    if logging.json {
        logger::init_json_logger(logging.verbose);
    } else {
        logger::init_cli_logger(logging.verbose);
    }
    tracing::debug!("Using record store at {}", settings.url);

    let store = match RestRecordStore::from_config(&settings) {
        Ok(store) => store,
        Err(e) => fail(&e),
    };
    let catalog = CatalogService::new(store).with_sink(Arc::new(LoggingSink));

    if let Err(e) = run(&catalog, cli.command).await {
        fail(&e);
    }
}

fn fail(e: &CatalogError) -> ! {
    tracing::error!("❌ {} (category: {:?})", e, e.category());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

async fn run(catalog: &CatalogService<RestRecordStore>, command: Command) -> Result<()> {
    match command {
        Command::Places {
            category,
            favorites,
            visited,
            search,
        } => {
            let filter = if let Some(query) = search {
                PlaceFilter::Search(query)
            } else if favorites {
                PlaceFilter::Favorites
            } else if visited {
                PlaceFilter::Visited
            } else if let Some(category) = category {
                PlaceFilter::Category(category)
            } else {
                PlaceFilter::All
            };
            print_json(&catalog.list_places(&filter).await?)
        }
        Command::Show { id } => print_json(&catalog.get_place(&PlaceId::from(id)).await?),
        Command::CreatePlace {
            name,
            description,
            address,
            category,
            image,
            opening_hours,
            ticket_price,
            facilities,
        } => {
            let mut place = NewPlace::new(name, description, address, category, image);
            place.opening_hours = opening_hours;
            place.ticket_price = ticket_price;
            place.facilities = facilities;
            let created = catalog.create_place(place).await?;
            tracing::info!("✅ Created place {}", created.id);
            print_json(&created)
        }
        Command::Favorite { id, off } => {
            print_json(&catalog.set_favorite(&PlaceId::from(id), !off).await?)
        }
        Command::Visit { id, off } => {
            print_json(&catalog.set_visited(&PlaceId::from(id), !off).await?)
        }
        Command::Delete { id } => {
            let id = PlaceId::from(id);
            catalog.delete_place(&id).await?;
            println!("✅ Deleted place {} and its reviews", id);
            Ok(())
        }
        Command::Random { categories } => {
            let filter = if categories.is_empty() {
                CategoryFilter::All
            } else {
                CategoryFilter::from_selection(&categories)
            };
            let mut rng = StdRng::from_entropy();
            match catalog.random_place(&filter, &mut rng).await? {
                Some(place) => print_json(&place),
                None => {
                    println!("No place matches the selected categories");
                    Ok(())
                }
            }
        }
        Command::Stats => print_json(&catalog.catalog_statistics().await?),
        Command::Reviews { place_id } => {
            print_json(&catalog.list_reviews(&PlaceId::from(place_id)).await?)
        }
        Command::ReviewAdd {
            place,
            author,
            rating,
            comment,
            date,
        } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let review = NewReview::new(place, author, rating, comment, date);
            print_outcome(catalog.create_review(review).await?)
        }
        Command::ReviewEdit {
            id,
            author,
            rating,
            comment,
        } => {
            let patch = ReviewPatch {
                author,
                rating,
                comment,
                date: None,
            };
            print_outcome(catalog.update_review(&ReviewId::from(id), patch).await?)
        }
        Command::ReviewDelete { id } => {
            print_outcome(catalog.delete_review(&ReviewId::from(id)).await?)
        }
        Command::ReviewStats { place_id } => {
            print_json(&catalog.review_statistics(&PlaceId::from(place_id)).await?)
        }
        Command::Recompute { place_id } => {
            let place_id = PlaceId::from(place_id);
            let rating = catalog.recompute_rating(&place_id).await?;
            println!("⭐ Rating of {} is now {:.1}", place_id, rating);
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_outcome<T: Serialize>(outcome: MutationOutcome<T>) -> Result<()> {
    for warning in &outcome.warnings {
        tracing::warn!("⚠️ {}", warning);
        eprintln!("⚠️ {}", warning);
    }
    print_json(&outcome.value)
}
