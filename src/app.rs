use crate::cli::{Cli, Command};
use crate::environment::{list_environments, Environment};
use crate::errors::ProbeError;
use crate::loader;
use crate::logger::Logger;
use crate::registry::request::CallOptions;
use crate::registry::RegistryContext;
use crate::session::Session;
use crate::utils::args::{parse_cmd_arguments, parse_module_name};
use crate::utils::prompt::{ConsolePrompter, Prompter};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

/// Long-lived wiring for one process: registry, transport session, and the
/// interactive prompt channel.
pub struct App {
    logger: Logger,
    registry: Arc<RegistryContext>,
    session: Session,
    prompter: Box<dyn Prompter>,
    workdir: PathBuf,
}

impl App {
    pub fn initialize() -> Result<Self, ProbeError> {
        let logger = Logger::new("apiprobe");
        let workdir = std::env::current_dir().map_err(ProbeError::Io)?;
        let registry = Arc::new(RegistryContext::new(logger.clone()));
        Ok(Self {
            logger,
            registry,
            session: Session::new(),
            prompter: Box::new(ConsolePrompter),
            workdir,
        })
    }

    pub async fn run(&self, cli: Cli) -> Result<(), ProbeError> {
        match cli.command {
            Command::Interactive { env, use_defaults } => {
                self.interactive(&env, use_defaults).await
            }
            Command::Request {
                request,
                env,
                use_defaults,
                arguments,
                no_cache,
            } => {
                let raw_arguments = parse_cmd_arguments(&arguments);
                self.execute_once(&request, &env, use_defaults, !no_cache, raw_arguments)
                    .await
            }
            Command::ListRequests { module } => self.list_requests(module.as_deref()),
            Command::ListEnvironments => {
                for name in list_environments(&self.workdir) {
                    println!("- {}", name);
                }
                Ok(())
            }
        }
    }

    fn ensure_loaded(&self) -> Result<(), ProbeError> {
        let workdir = self.workdir.clone();
        let logger = self.logger.clone();
        self.registry
            .ensure_loaded(|registry| loader::load_all(registry, &workdir, &logger))
    }

    /// One request end to end: resolve, invoke, print the result envelope.
    /// Null results stay silent, matching a fire-and-forget probe.
    async fn execute_request(
        &self,
        identifier: &str,
        environment: &Environment,
        use_defaults: bool,
        cache: bool,
        raw_arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), ProbeError> {
        let request = self.registry.find(identifier)?;
        let options = CallOptions::new()
            .use_defaults(use_defaults)
            .cache(cache)
            .arguments(raw_arguments);
        let outcome = request
            .call(
                environment,
                &self.session,
                options,
                self.registry.cache(),
                self.prompter.as_ref(),
            )
            .await?;
        if !outcome.is_null() {
            println!("{}", outcome);
        }
        Ok(())
    }

    async fn execute_once(
        &self,
        identifier: &str,
        env_name: &str,
        use_defaults: bool,
        cache: bool,
        raw_arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), ProbeError> {
        self.ensure_loaded()?;
        let environment = Environment::load(&self.workdir, env_name)?;
        self.execute_request(identifier, &environment, use_defaults, cache, raw_arguments)
            .await
    }

    /// Strictly sequential REPL: each request runs to completion before the
    /// next line is read. A prompt interrupt ends the session.
    async fn interactive(&self, env_name: &str, use_defaults: bool) -> Result<(), ProbeError> {
        self.ensure_loaded()?;
        let environment = Environment::load(&self.workdir, env_name)?;
        let candidates = self.completion_candidates();
        println!(
            "{}",
            "apiprobe interactive mode; press ^C to exit.".dimmed()
        );
        loop {
            let line = match self.prompter.read_command(">", &candidates) {
                Ok(line) => line,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => break,
                Err(err) => return Err(ProbeError::Io(err)),
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == "exit" {
                break;
            }
            let mut tokens = line.split_whitespace();
            let identifier = tokens.next().unwrap_or_default();
            let raw_arguments = parse_cmd_arguments(&tokens.collect::<Vec<_>>());
            let result = self
                .execute_request(identifier, &environment, use_defaults, true, raw_arguments)
                .await;
            match result {
                Ok(()) => {}
                Err(err) if err.is_interrupt() => break,
                Err(err) => println!("{}", err.to_string().red()),
            }
        }
        Ok(())
    }

    /// Request names, bare and module-qualified, for REPL tab-completion.
    fn completion_candidates(&self) -> Vec<String> {
        let mut candidates = Vec::new();
        for (module, requests) in self.registry.snapshot() {
            for name in requests.keys() {
                candidates.push(name.clone());
                candidates.push(format!("{}:{}", module, name));
            }
        }
        candidates.sort();
        candidates.dedup();
        candidates
    }

    fn list_requests(&self, filter: Option<&str>) -> Result<(), ProbeError> {
        self.ensure_loaded()?;
        let (module_filter, name_filter) = parse_module_name(filter);
        for (module, requests) in self.registry.snapshot() {
            if module_filter.as_deref().is_some_and(|m| m != module) {
                continue;
            }
            let mut module_printed = false;
            for request in requests.values() {
                if name_filter.as_deref().is_some_and(|n| n != request.name) {
                    continue;
                }
                if !module_printed {
                    println!("{}", format!("{}:", module).bold());
                    module_printed = true;
                }
                for line in request.to_string().lines() {
                    println!(" {}", line);
                }
            }
        }
        Ok(())
    }
}
