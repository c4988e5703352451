use anyhow::Result;
use clap::Parser;
use console::style;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

use bootsmith::app::App;
use bootsmith::naming::Category;
use bootsmith::organize::organize_project_files;
use bootsmith::output::OutputHandler;

#[derive(Parser)]
#[command(name = "bootsmith")]
#[command(about = "AI assistant for generating Spring Boot projects with a local Ollama model", long_about = None)]
struct Cli {
    /// Model to use (overrides the config file)
    #[arg(long)]
    model: Option<String>,

    /// Ollama endpoint to connect to
    #[arg(long)]
    endpoint: Option<String>,

    /// Run in verbose mode
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bootsmith=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bootsmith=warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let app = App::new()?;
    let mut config = app.config.clone();
    if let Some(model) = cli.model {
        config.ai.model = model;
    }
    if let Some(endpoint) = cli.endpoint {
        config.ai.api_url = endpoint;
    }
    let mut app = App::with_config(config)?;

    let output = OutputHandler::new();
    output.print_system(&format!(
        "bootsmith, a Spring Boot assistant (model: {}, endpoint: {})",
        app.config.ai.model, app.config.ai.api_url
    ));
    output.print_system("Type a prompt, or /help for commands.");

    let stdin = io::stdin();
    loop {
        print!("{} ", style("›").cyan().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            if !handle_command(&mut app, &output, command).await? {
                break;
            }
        } else {
            run_chat_turn(&mut app, &output, line).await;
        }
    }

    Ok(())
}

async fn run_chat_turn(app: &mut App, output: &OutputHandler, prompt: &str) {
    output.print_assistant_label();
    let outcome = app.chat_turn(prompt, |chunk| output.print_chunk(chunk)).await;
    println!();

    if let Some(diagnostic) = &outcome.diagnostic {
        output.print_error(diagnostic);
        output.print_system(
            "Troubleshooting: check `ollama serve`, pull the model, or run /connect.",
        );
        return;
    }

    output.print_registered_files(&outcome.registered);
}

/// Dispatches a slash command. Returns false when the loop should exit.
async fn handle_command(app: &mut App, output: &OutputHandler, command: &str) -> Result<bool> {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match name {
        "quit" | "exit" => return Ok(false),
        "help" => print_help(output),
        "connect" => run_connect(app, output).await,
        "model" => match args.first() {
            Some(model) => {
                app.set_model(model)?;
                output.print_success(&format!("model set to {}", model));
            }
            None => output.print_system(&format!("current model: {}", app.config.ai.model)),
        },
        "meta" => {
            let m = &app.session.metadata;
            output.print_system(&format!(
                "app_name={} group_id={} artifact_id={} java_version={} spring_boot_version={}\ndescription: {}",
                m.app_name, m.group_id, m.artifact_id, m.java_version, m.spring_boot_version, m.description
            ));
        }
        "set" => match (args.first(), args.len() >= 2) {
            (Some(field), true) => {
                let value = args[1..].join(" ");
                let m = &mut app.session.metadata;
                match *field {
                    "app_name" => m.app_name = value,
                    "group_id" => m.group_id = value,
                    "artifact_id" => m.artifact_id = value,
                    "description" => m.description = value,
                    "java_version" => m.java_version = value,
                    "spring_boot_version" => m.spring_boot_version = value,
                    other => {
                        output.print_error(&format!("unknown metadata field: {}", other));
                        return Ok(true);
                    }
                }
                output.print_success("metadata updated");
            }
            _ => output.print_system("usage: /set <field> <value>"),
        },
        "files" => print_files(app, output),
        "test" => match args.first() {
            Some(filename) => match app.generate_unit_test(filename).await {
                Ok(test_filename) => {
                    output.print_success(&format!("test generated: {}", test_filename))
                }
                Err(e) => output.print_error(&e.to_string()),
            },
            None => output.print_system("usage: /test <filename>"),
        },
        "integration" => match app.generate_integration_tests().await {
            Ok(filename) => output.print_success(&format!("test generated: {}", filename)),
            Err(e) => output.print_error(&e.to_string()),
        },
        "docs" => match app.generate_documentation().await {
            Ok(filename) => output.print_success(&format!("documentation generated: {}", filename)),
            Err(e) => output.print_error(&e.to_string()),
        },
        "openapi" => match app.generate_openapi_spec().await {
            Ok(filename) => output.print_success(&format!("specification generated: {}", filename)),
            Err(e) => output.print_error(&e.to_string()),
        },
        "docker" => match app.generate_docker_files().await {
            Ok(filenames) => {
                output.print_success(&format!("generated: {}", filenames.join(", ")))
            }
            Err(e) => output.print_error(&e.to_string()),
        },
        "ci" => match app.generate_ci_workflow().await {
            Ok(filename) => output.print_success(&format!(
                "workflow generated: {} (place under .github/workflows/)",
                filename
            )),
            Err(e) => output.print_error(&e.to_string()),
        },
        "zip" => {
            let use_scaffold = !args.contains(&"--plain");
            let path = args
                .iter()
                .find(|arg| !arg.starts_with("--"))
                .copied()
                .unwrap_or("spring-boot-project.zip");
            match app.build_zip(use_scaffold).await {
                Ok(bytes) => {
                    std::fs::write(path, &bytes)?;
                    output.print_success(&format!("archive written to {}", path));
                }
                Err(e) => output.print_error(&format!("archive failed: {}", e)),
            }
        }
        "build" => {
            output.print_system("building with Maven, this can take a few minutes...");
            let outcome = app.run_local_build().await;
            output.print_build_outcome(&outcome);
        }
        "logs" => {
            let entries = app.session.recent_logs(20);
            if entries.is_empty() {
                output.print_system("no log entries");
            }
            for entry in entries {
                println!("{}", entry);
            }
        }
        "clear-logs" => {
            app.session.clear_logs();
            output.print_success("logs cleared");
        }
        "clear" => {
            app.clear_conversation();
            output.print_success("conversation cleared");
        }
        _ => {
            output.print_error(&format!("unknown command: /{}", name));
            output.print_system("Type /help for the command list.");
        }
    }

    Ok(true)
}

async fn run_connect(app: &mut App, output: &OutputHandler) {
    match app.client().test_connection().await {
        Ok(models) => {
            output.print_success(&format!("connected, models: {}", models.join(", ")))
        }
        Err(e) => {
            output.print_error(&format!("connection failed: {}", e));
            return;
        }
    }

    let model = app.config.ai.model.clone();
    match app.client().check_model(&model).await {
        Ok(true) => output.print_success(&format!("model '{}' is available", model)),
        Ok(false) => output.print_system(&format!(
            "model '{}' does not appear to be loaded; try `ollama pull {}`",
            model, model
        )),
        Err(e) => output.print_error(&format!("model check failed: {}", e)),
    }

    match app.client().test_model().await {
        Ok(preview) => output.print_success(&format!("model responded: {}", preview)),
        Err(e) => output.print_error(&format!("model test failed: {}", e)),
    }
}

fn print_files(app: &App, output: &OutputHandler) {
    for category in [Category::Main, Category::Test, Category::Config] {
        let names = app.session.filenames_in_category(category);
        output.print_system(&format!("{} ({}):", category, names.len()));
        for name in names {
            println!("  {}", name);
        }
    }

    let layout = organize_project_files(&app.session.all_files());
    output.print_system("project structure:");
    for (role, files) in &layout {
        for filename in files.keys() {
            let dir = role.path();
            if dir.is_empty() {
                println!("  {}", filename);
            } else {
                println!("  {}/{}", dir, filename);
            }
        }
    }
}

fn print_help(output: &OutputHandler) {
    output.print_system(
        "commands:\n\
         /connect              probe the backend and the configured model\n\
         /model [name]         show or switch the model\n\
         /meta                 show project metadata\n\
         /set <field> <value>  edit project metadata\n\
         /files                list artifacts and the organized structure\n\
         /test <file>          generate a unit test for a stored Java file\n\
         /integration          generate API integration tests\n\
         /docs                 generate project documentation (README.md)\n\
         /openapi              generate an OpenAPI specification\n\
         /docker               generate Dockerfile + docker-compose.yml\n\
         /ci                   generate a GitHub Actions workflow\n\
         /zip [path] [--plain] write the project archive (Initializr merge by default)\n\
         /build                build the project locally with Maven\n\
         /logs                 show recent session logs\n\
         /clear-logs           clear the session log\n\
         /clear                clear the conversation context\n\
         /quit                 exit",
    );
}
