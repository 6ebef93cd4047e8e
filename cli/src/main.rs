mod commands;
mod config;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    FoodInput, GoalsUpdate, cmd_delete, cmd_entries, cmd_export, cmd_food_add, cmd_food_delete,
    cmd_food_list, cmd_goals_set, cmd_goals_show, cmd_import, cmd_log, cmd_meal_add,
    cmd_meal_delete, cmd_meal_list, cmd_meal_show, cmd_profile_set, cmd_profile_show,
    cmd_weight_history, cmd_weight_log, cmd_workout_add, cmd_workout_delete, cmd_workout_done,
    cmd_workout_history, cmd_workout_list,
};
use crate::config::Config;
use stride_core::service::StrideService;

#[derive(Parser)]
#[command(
    name = "stride",
    version,
    about = "Workout and nutrition tracker with portable backups"
)]
struct Cli {
    /// User id to act as
    #[arg(long, global = true, default_value = "local")]
    user: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export all data for the user as a backup snapshot
    Export {
        /// File to write (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge a backup snapshot into the user's data
    Import {
        /// Path to the backup JSON file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
    /// Show or edit the user profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Show or edit daily nutrition and weekly workout goals
    Goals {
        #[command(subcommand)]
        command: GoalsCommands,
    },
    /// Manage foods
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Log servings of a food
    Log {
        /// Food ID (see `stride food list`)
        food_id: String,
        /// Number of servings
        servings: f64,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short, long, default_value = "snack")]
        meal: String,
        /// Date to log for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the food log for a day
    Entries {
        /// Date to show (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a food log entry by ID
    Delete {
        /// Entry ID (see `stride entries`)
        entry_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage workouts and record completed sessions
    Workout {
        #[command(subcommand)]
        command: WorkoutCommands,
    },
    /// Track body weight
    Weight {
        #[command(subcommand)]
        command: WeightCommands,
    },
    /// Manage saved meals
    Meal {
        #[command(subcommand)]
        command: MealCommands,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update profile fields
    Set {
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// Avatar: mercury, venus, earth, mars, jupiter, saturn, uranus, neptune
        #[arg(long)]
        avatar: Option<String>,
        /// Unit system: metric or imperial
        #[arg(long)]
        units: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GoalsCommands {
    /// Show current goals
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update goals (unspecified fields are kept)
    Set {
        /// Daily calories
        #[arg(long)]
        calories: Option<i64>,
        /// Daily protein (g)
        #[arg(long)]
        protein: Option<i64>,
        /// Daily carbs (g)
        #[arg(long)]
        carbs: Option<i64>,
        /// Daily fats (g)
        #[arg(long)]
        fats: Option<i64>,
        /// Workouts per week
        #[arg(long)]
        workouts: Option<i64>,
        /// Target body weight
        #[arg(long)]
        target_weight: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Add a saved food
    Add {
        /// Food name
        name: String,
        /// Serving description (e.g. "1 cup", "100 g")
        #[arg(long)]
        serving: String,
        /// Calories per serving
        #[arg(long)]
        calories: i64,
        /// Protein per serving (g)
        #[arg(long, default_value = "0")]
        protein: f64,
        /// Carbs per serving (g)
        #[arg(long, default_value = "0")]
        carbs: f64,
        /// Fats per serving (g)
        #[arg(long, default_value = "0")]
        fats: f64,
        /// Fiber per serving (g)
        #[arg(long, default_value = "0")]
        fiber: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List saved foods
    List {
        /// Include unsaved foods created for one-off entries
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a food and every log entry that uses it
    Delete {
        /// Food ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WorkoutCommands {
    /// Create a workout template
    Add {
        /// Workout name
        name: String,
        /// Exercise as name:sets:reps[:weight] (repeatable, e.g. "Squat:5:5:225")
        #[arg(short, long = "exercise")]
        exercises: Vec<String>,
        /// Scheduled weekdays, comma-separated, 0 = Sunday (e.g. "1,3,5")
        #[arg(long)]
        days: Option<String>,
        /// Display color (e.g. "#FF6B6B")
        #[arg(long)]
        color: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List workouts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a completed session of a workout
    Done {
        /// Workout ID (see `stride workout list`)
        workout_id: String,
        /// Duration in minutes
        #[arg(short, long, default_value = "0")]
        duration: i64,
        /// Optional notes
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show completed sessions
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a workout template (completed sessions are kept)
    Delete {
        /// Workout ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WeightCommands {
    /// Log a weight entry
    Log {
        /// Weight value in the profile's unit system
        value: f64,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show weight history
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum MealCommands {
    /// Save a meal recipe
    Add {
        /// Meal name
        name: String,
        /// Ingredient as name:amount:unit:cal:protein:carbs:fats[:fiber] (repeatable)
        #[arg(short, long = "ingredient")]
        ingredients: Vec<String>,
        /// Number of servings the recipe makes
        #[arg(short, long, default_value = "1")]
        servings: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List saved meals
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a meal's ingredients and per-serving nutrition
    Show {
        /// Meal ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a saved meal
    Delete {
        /// Meal ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("STRIDE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db_path = config.db_path.to_string_lossy().into_owned();
    let svc = StrideService::new(&db_path, &cli.user)?;

    match cli.command {
        Commands::Export { output } => cmd_export(&svc, output.as_deref()),
        Commands::Import { file, json } => cmd_import(&svc, &file, json),
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let (api_key, new_api_key) = if no_auth {
                (None, false)
            } else {
                let (key, new) = config.load_or_create_api_key()?;
                (Some(key), new)
            };
            server::start_server(svc, port, &bind, api_key, new_api_key).await
        }
        Commands::Profile { command } => match command {
            ProfileCommands::Show { json } => cmd_profile_show(&svc, json),
            ProfileCommands::Set {
                name,
                avatar,
                units,
                json,
            } => cmd_profile_set(
                &svc,
                name.as_deref(),
                avatar.as_deref(),
                units.as_deref(),
                json,
            ),
        },
        Commands::Goals { command } => match command {
            GoalsCommands::Show { json } => cmd_goals_show(&svc, json),
            GoalsCommands::Set {
                calories,
                protein,
                carbs,
                fats,
                workouts,
                target_weight,
                json,
            } => cmd_goals_set(
                &svc,
                &GoalsUpdate {
                    calories,
                    protein,
                    carbs,
                    fats,
                    workouts,
                    target_weight,
                },
                json,
            ),
        },
        Commands::Food { command } => match command {
            FoodCommands::Add {
                name,
                serving,
                calories,
                protein,
                carbs,
                fats,
                fiber,
                json,
            } => cmd_food_add(
                &svc,
                FoodInput {
                    name,
                    serving,
                    calories,
                    protein,
                    carbs,
                    fats,
                    fiber,
                },
                json,
            ),
            FoodCommands::List { all, json } => cmd_food_list(&svc, all, json),
            FoodCommands::Delete { id, json } => cmd_food_delete(&svc, &id, json),
        },
        Commands::Log {
            food_id,
            servings,
            meal,
            date,
            json,
        } => cmd_log(&svc, &food_id, servings, &meal, date, json),
        Commands::Entries { date, json } => cmd_entries(&svc, date, json),
        Commands::Delete { entry_id, json } => cmd_delete(&svc, &entry_id, json),
        Commands::Workout { command } => match command {
            WorkoutCommands::Add {
                name,
                exercises,
                days,
                color,
                json,
            } => cmd_workout_add(
                &svc,
                &name,
                &exercises,
                days.as_deref(),
                color.as_deref(),
                json,
            ),
            WorkoutCommands::List { json } => cmd_workout_list(&svc, json),
            WorkoutCommands::Done {
                workout_id,
                duration,
                notes,
                json,
            } => cmd_workout_done(&svc, &workout_id, duration, notes, json),
            WorkoutCommands::History { json } => cmd_workout_history(&svc, json),
            WorkoutCommands::Delete { id, json } => cmd_workout_delete(&svc, &id, json),
        },
        Commands::Weight { command } => match command {
            WeightCommands::Log { value, date, json } => cmd_weight_log(&svc, value, date, json),
            WeightCommands::History { json } => cmd_weight_history(&svc, json),
        },
        Commands::Meal { command } => match command {
            MealCommands::Add {
                name,
                ingredients,
                servings,
                json,
            } => cmd_meal_add(&svc, &name, &ingredients, servings, json),
            MealCommands::List { json } => cmd_meal_list(&svc, json),
            MealCommands::Show { id, json } => cmd_meal_show(&svc, &id, json),
            MealCommands::Delete { id, json } => cmd_meal_delete(&svc, &id, json),
        },
    }
}
