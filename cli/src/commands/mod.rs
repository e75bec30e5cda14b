pub mod create_tables;
pub mod etl;
pub mod query;

use anyhow::Result;

use crate::cli::{Cli, Commands};

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::CreateTables {
            db_path,
        } => create_tables::run(&db_path),
        Commands::Etl {
            db_path,
            song_data,
            log_data,
        } => etl::run(&db_path, &song_data, &log_data),
        Commands::Query {
            db_path,
            table,
            limit,
            offset,
            format,
        } => query::run(&db_path, query::QueryOptions {
            table,
            limit,
            offset,
            format,
        }),
        Commands::Describe {
            db_path,
            table,
        } => query::describe(&db_path, &table),
        Commands::Stats {
            db_path,
        } => query::stats(&db_path),
    }
}
