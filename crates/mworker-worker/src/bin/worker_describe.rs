//! Print the reference worker's description, parameters and the job
//! message schema as JSON.

use schemars::schema_for;
use serde::Serialize;

use mworker_models::{Job, ParameterSpec, WorkerDescriptor};
use mworker_sdk::MediaWorker;
use mworker_worker::ExampleMediaWorker;

#[derive(Serialize)]
struct Description {
    #[serde(flatten)]
    descriptor: WorkerDescriptor,
    parameters: Vec<ParameterSpec>,
    job_schema: schemars::schema::RootSchema,
}

fn main() -> anyhow::Result<()> {
    let worker = ExampleMediaWorker::new();

    let description = Description {
        descriptor: worker.describe(),
        parameters: worker.parameters(),
        job_schema: schema_for!(Job),
    };

    println!("{}", serde_json::to_string_pretty(&description)?);
    Ok(())
}
