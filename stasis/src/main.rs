use stasis::commands::command_argument_builder;
use stasis::handlers::handle_mirror;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    match chosen_command.subcommand() {
        Some(("mirror", primary_command)) => handle_mirror(primary_command, quiet).await,
        None => {
            // Nothing to do without a subcommand
            let _ = command_argument_builder().print_help();
        }
        _ => unreachable!("clap should ensure we don't get here"),
    }
}
