use clap::{Parser, Subcommand};
use pms_core::{
    config::store_path_from_env_value, Gender, JsonFileStore, Patch, Patient, PatientPatch,
    RegistryService, SortKey, SortOrder,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pms")]
#[command(about = "Patient management system CLI")]
struct Cli {
    /// Patient store file (defaults to PMS_STORE_PATH or patients.json)
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty patient store file
    Init,
    /// List all patients
    List,
    /// Show one patient with derived health metrics
    Get {
        /// Patient id
        id: String,
    },
    /// List patients sorted by a field
    Sort {
        /// Field to sort by: gender or age
        sort_by: String,
        /// Direction: asc or desc
        #[arg(long, default_value = "asc")]
        order: String,
    },
    /// Create a new patient
    Create {
        /// Patient id
        id: String,
        /// Name of the patient
        name: String,
        /// City of the patient
        city: String,
        /// Age of the patient
        age: i64,
        /// Gender: Male, Female or Other
        gender: String,
        /// Height in metres
        height: f64,
        /// Weight in kilograms
        weight: f64,
    },
    /// Update fields on an existing patient
    Edit {
        /// Patient id
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        age: Option<i64>,
        /// Gender: Male, Female or Other
        #[arg(long)]
        gender: Option<String>,
        /// Height in metres
        #[arg(long)]
        height: Option<f64>,
        /// Weight in kilograms
        #[arg(long)]
        weight: Option<f64>,
    },
    /// Delete a patient
    Delete {
        /// Patient id
        id: String,
    },
}

fn print_patient(patient: &Patient) {
    println!(
        "ID: {}, Name: {}, City: {}, Age: {}, Gender: {}, Height: {} m, Weight: {} kg, BMI: {}, Verdict: {}",
        patient.id(),
        patient.name(),
        patient.city(),
        patient.age(),
        patient.gender(),
        patient.height(),
        patient.weight(),
        patient.bmi(),
        patient.verdict(),
    );
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let store_path = cli
        .store
        .unwrap_or_else(|| store_path_from_env_value(std::env::var("PMS_STORE_PATH").ok()));
    let file_store = JsonFileStore::new(store_path);
    let registry = RegistryService::new(Arc::new(file_store.clone()));

    match cli.command {
        Commands::Init => {
            if file_store.initialise()? {
                println!("Created empty patient store: {}", file_store.path().display());
            } else {
                println!(
                    "Patient store already exists: {}",
                    file_store.path().display()
                );
            }
        }
        Commands::List => {
            let store = registry.list()?;
            if store.is_empty() {
                println!("No patients found.");
            } else {
                println!("{}", serde_json::to_string_pretty(&store)?);
            }
        }
        Commands::Get { id } => {
            let patient = registry.get(&id)?;
            print_patient(&patient);
        }
        Commands::Sort { sort_by, order } => {
            let key = SortKey::parse(&sort_by)?;
            let order = SortOrder::parse(&order)?;
            for patient in registry.sort(key, order)? {
                print_patient(&patient);
            }
        }
        Commands::Create {
            id,
            name,
            city,
            age,
            gender,
            height,
            weight,
        } => {
            let gender = Gender::parse(&gender)?;
            let patient = Patient::new(id, name, city, age, gender, height, weight)?;
            registry.create(&patient)?;
            println!("Patient created successfully!");
        }
        Commands::Edit {
            id,
            name,
            city,
            age,
            gender,
            height,
            weight,
        } => {
            fn flag<T>(value: Option<T>) -> Patch<T> {
                value.map_or(Patch::Absent, Patch::Value)
            }

            let patch = PatientPatch {
                name: flag(name),
                city: flag(city),
                age: flag(age),
                gender: flag(gender),
                height: flag(height),
                weight: flag(weight),
            };
            let updated = registry.update(&id, &patch)?;
            print_patient(&updated);
        }
        Commands::Delete { id } => {
            registry.delete(&id)?;
            println!("Patient deleted successfully!");
        }
    }

    Ok(())
}
