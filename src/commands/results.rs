use super::CommandResult;
use crate::database::ElectionsDatabase;
use crate::results::{self, ElectionResults, ResultsError, NOT_FINALIZED_WARNING, PROCESS_LIST_TITLE};
use colored::Colorize;

pub async fn show_processes(db: &ElectionsDatabase) -> CommandResult {
    let processes = db.get_all_processes().await?;

    println!("🗳️  {}", PROCESS_LIST_TITLE.bold());
    if processes.is_empty() {
        println!("   (no election processes)");
        return Ok(());
    }

    for process in processes {
        let status = if process.status.is_finalized() {
            process.status.to_string().green()
        } else {
            process.status.to_string().yellow()
        };
        println!(
            "  {:>4}  {:<40} {}  {}",
            process.id.to_string().bright_cyan(),
            process.name,
            process.date.format("%d/%m/%Y"),
            status
        );
    }

    Ok(())
}

pub async fn show_results(db: &ElectionsDatabase, process_id: i64, as_json: bool) -> CommandResult {
    let results = match results::results_for_process(db, process_id).await {
        Ok(results) => results,
        Err(e @ ResultsError::NotFinalized { .. }) => {
            eprintln!("⚠️  {}", NOT_FINALIZED_WARNING.yellow());
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_results(&results);
    }

    Ok(())
}

fn print_results(results: &ElectionResults) {
    let tally = &results.tally;

    println!(
        "📊 {} ({})",
        results.process.name.bold(),
        results.process.date.format("%d/%m/%Y")
    );
    println!();
    println!("  {:<30} {:>8} {:>12}", "Lista", "Votos", "Porcentaje");
    for list in &tally.lists {
        let line = format!(
            "  {:<30} {:>8} {:>11.2}%",
            list.name, list.votes, list.percentage
        );
        if list.is_winner {
            println!("{} 🏆", line.green().bold());
        } else {
            println!("{}", line);
        }
    }
    println!(
        "  {:<30} {:>8} {:>11.2}%",
        "Votos en Blanco", tally.blank.votes, tally.blank.percentage
    );
    println!(
        "  {:<30} {:>8} {:>11.2}%",
        "Votos Nulos", tally.null.votes, tally.null.percentage
    );
    println!(
        "  {:<30} {:>8} {:>12}",
        "TOTAL".bold(),
        tally.total_votes,
        "100.00%"
    );
    println!();

    match &tally.winner {
        Some(winner) => println!(
            "🏆 Ganador: {} con {} votos",
            winner.name.bright_green().bold(),
            winner.votes
        ),
        None => println!("{}", "Sin ganador".yellow()),
    }
    println!(
        "👥 Participación: {} de {} estudiantes ({:.2}%), {} no votaron",
        tally.total_votes,
        tally.eligible_voters,
        tally.participation_percentage,
        tally.not_voted
    );
}
