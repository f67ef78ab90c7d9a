//! Command handlers for the `glimps` binary

use super::output::{progress_bar, Output};
use super::{
    Cli, Commands, JobCommands, JobFilterArgs, ModelCommands, MoleculeCommands, PageArgs,
    ProjectCommands, ViewArgs,
};
use crate::api::{self, ApiClient, UnauthorizedHandler};
use crate::auth::{GuardDecision, RouteGuard, Session, SessionStore};
use crate::forms::{
    InferenceForm, ModelForm, ProjectForm, ProjectSettingsForm, TrainModelForm,
    UploadMoleculeForm,
};
use crate::jobs::{JobFeed, JobListState, JobPoller};
use crate::store::ViewerStore;
use crate::types::{AppError, FileFormat, GlimpsOptions, Job, JobFilter};
use crate::utils::config::GlimpsConfig;
use crate::viewer::{
    CapabilityLoader, HtmlSceneCapability, HttpStructureSource, MemoryContainer, StructureFormat,
    StructureViewer, ViewerInput, ViewerState,
};
use crate::views::{DashboardSummary, DetailView, ResourceList};
use anyhow::{anyhow, bail, Context as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Everything a command needs.
pub struct Context {
    pub config: GlimpsConfig,
    pub session: Arc<SessionStore>,
    pub client: Arc<ApiClient>,
    pub guard: RouteGuard,
    pub out: Output,
}

impl Context {
    pub fn new(config: GlimpsConfig, no_color: bool) -> anyhow::Result<Self> {
        let session = Arc::new(SessionStore::open(&config.auth.session_file)?);

        // A rejected token means the stored session is stale.
        let on_unauthorized: UnauthorizedHandler = {
            let session = Arc::clone(&session);
            Arc::new(move || {
                warn!("Backend rejected the session, signing out");
                if let Err(e) = session.clear() {
                    warn!("Failed to clear session: {}", e);
                }
            })
        };
        let client = ApiClient::new(
            config.api.base_url.clone(),
            session.clone(),
            config.client_options(),
        )?
        .with_unauthorized_handler(on_unauthorized);

        Ok(Self {
            config,
            session,
            client: Arc::new(client),
            guard: RouteGuard::default(),
            out: if no_color {
                Output::no_color()
            } else {
                Output::new()
            },
        })
    }
}

pub async fn execute(cli: Cli, config: GlimpsConfig) -> anyhow::Result<()> {
    let ctx = Context::new(config, cli.no_color)?;

    if let Some(route) = cli.command.route() {
        match ctx.guard.check(route, ctx.session.is_authenticated()) {
            GuardDecision::Allow => {}
            GuardDecision::RedirectToLogin { location } => {
                ctx.out.error("You are not signed in");
                ctx.out.hint(&format!("Sign in to continue to {}", location));
                ctx.out.command("glimps login --email <EMAIL>");
                return Err(AppError::Unauthorized("no stored session".to_string()).into());
            }
            GuardDecision::RedirectToDashboard => {
                let email = ctx
                    .session
                    .current()
                    .map(|s| s.user.email)
                    .unwrap_or_default();
                ctx.out.info(&format!("Already signed in as {}", email));
                ctx.out.hint("Sign out first to switch accounts");
                ctx.out.command("glimps logout");
                return Ok(());
            }
        }
    }

    match cli.command {
        Commands::Login { email, password } => login(&ctx, &email, password).await,
        Commands::Register {
            email,
            full_name,
            password,
        } => register(&ctx, &email, &full_name, password).await,
        Commands::Logout => logout(&ctx),
        Commands::Whoami => whoami(&ctx).await,
        Commands::Dashboard => dashboard(&ctx).await,
        Commands::Config { validate } => show_config(&ctx, validate),
        Commands::View(args) => view_source(&ctx, args).await,
        Commands::Projects(cmd) => projects(&ctx, cmd).await,
        Commands::Molecules(cmd) => molecules(&ctx, cmd).await,
        Commands::Models(cmd) => models(&ctx, cmd).await,
        Commands::Jobs(cmd) => jobs(&ctx, cmd).await,
    }
}

// ============= Session =============

fn read_password(ctx: &Context, password: Option<String>) -> anyhow::Result<String> {
    match password {
        Some(password) => Ok(password),
        None => Ok(ctx.out.prompt("Password")?),
    }
}

async fn login(ctx: &Context, email: &str, password: Option<String>) -> anyhow::Result<()> {
    let password = read_password(ctx, password)?;
    let auth = api::user::login(&ctx.client, email, &password).await?;
    sign_in(ctx, Session::from(auth))
}

async fn register(
    ctx: &Context,
    email: &str,
    full_name: &str,
    password: Option<String>,
) -> anyhow::Result<()> {
    let password = read_password(ctx, password)?;
    let auth = api::user::register(&ctx.client, email, &password, full_name).await?;
    sign_in(ctx, Session::from(auth))
}

fn sign_in(ctx: &Context, session: Session) -> anyhow::Result<()> {
    let name = session.user.full_name.clone();
    ctx.session.save(session)?;
    ctx.client.clear_auth_cache();
    ctx.out.success(&format!("Signed in as {}", name));
    Ok(())
}

fn logout(ctx: &Context) -> anyhow::Result<()> {
    ctx.session.clear()?;
    ctx.client.clear_auth_cache();
    ctx.out.success("Signed out");
    Ok(())
}

async fn whoami(ctx: &Context) -> anyhow::Result<()> {
    let user = api::user::me(&ctx.client).await?;
    ctx.out.header(&user.full_name);
    ctx.out.kv("Email", &user.email);
    ctx.out.kv("Id", &user.id);
    ctx.out.kv("Verified", if user.is_verified { "yes" } else { "no" });
    ctx.out.kv("Member since", &user.created_at.format("%Y-%m-%d").to_string());
    Ok(())
}

async fn dashboard(ctx: &Context) -> anyhow::Result<()> {
    let summary = DashboardSummary::load(&ctx.client).await?;
    ctx.out.header("Dashboard");
    ctx.out.kv("Projects", &summary.projects.to_string());
    ctx.out.kv("Trained models", &summary.trained_models.to_string());
    ctx.out.kv("Active jobs", &summary.active_jobs.to_string());

    if !summary.recent_jobs.is_empty() {
        ctx.out.header("Recent jobs");
        for job in &summary.recent_jobs {
            ctx.out.job_row(job);
        }
    }
    Ok(())
}

fn show_config(ctx: &Context, validate: bool) -> anyhow::Result<()> {
    if validate {
        ctx.config.validate()?;
        ctx.out.success("Configuration is valid");
        return Ok(());
    }
    let rendered = toml::to_string_pretty(&ctx.config)?;
    println!("{}", rendered);
    Ok(())
}

// ============= Projects =============

async fn projects(ctx: &Context, cmd: ProjectCommands) -> anyhow::Result<()> {
    let client = &ctx.client;
    match cmd {
        ProjectCommands::List { limit, offset } => {
            let list = ResourceList::new("projects");
            list.load(|| async move {
                api::projects::list(client, limit, offset)
                    .await
                    .map(|page| page.projects)
            })
            .await;
            if let Some(error) = list.error() {
                bail!(error);
            }

            ctx.out.header("Projects");
            if list.is_empty() {
                ctx.out.info("No projects yet");
                ctx.out.command("glimps projects create --name <NAME>");
                return Ok(());
            }
            ctx.out
                .table_header(&[("ID", 36), ("Name", 24), ("Updated", 16), ("Description", 32)]);
            for project in list.items() {
                let updated = project.updated_at.format("%Y-%m-%d %H:%M").to_string();
                ctx.out.table_row(&[
                    (project.id.as_str(), 36),
                    (project.name.as_str(), 24),
                    (updated.as_str(), 16),
                    (project.description.as_deref().unwrap_or(""), 32),
                ]);
            }
        }
        ProjectCommands::Show { id } => {
            let mut view = DetailView::new("project");
            view.load(api::projects::get(client, &id)).await;
            if let Some(error) = view.error() {
                bail!(error.to_string());
            }
            let detail = view
                .into_item()
                .ok_or_else(|| anyhow!("Project not found"))?;

            ctx.out.header(&detail.project.name);
            ctx.out.kv("Id", &detail.project.id);
            ctx.out.kv(
                "Description",
                detail.project.description.as_deref().unwrap_or("-"),
            );
            ctx.out.kv(
                "Owner",
                &format!("{} <{}>", detail.owner.full_name, detail.owner.email),
            );
            ctx.out.kv("Molecules", &detail.molecule_count.to_string());
            ctx.out.kv("Models", &detail.model_count.to_string());
            ctx.out.kv(
                "Created",
                &detail.project.created_at.format("%Y-%m-%d %H:%M").to_string(),
            );
        }
        ProjectCommands::Create { name, description } => {
            let project = ProjectForm { name, description }.submit(client).await?;
            ctx.out
                .success(&format!("Created project {} ({})", project.name, project.id));
        }
        ProjectCommands::Update {
            id,
            name,
            description,
        } => {
            let current = api::projects::get(client, &id).await?;
            let mut form = ProjectSettingsForm::from_project(&current.project);
            if let Some(name) = name {
                form.name = name;
            }
            if let Some(description) = description {
                form.description = description;
            }
            let project = form.submit(client, &id).await?;
            ctx.out.success(&format!("Saved project {}", project.name));
        }
        ProjectCommands::Delete { id, yes } => {
            if !yes && !ctx.out.confirm(&format!("Delete project {} and everything in it?", id)) {
                ctx.out.info("Cancelled");
                return Ok(());
            }
            api::projects::delete(client, &id).await?;
            ctx.out.success(&format!("Deleted project {}", id));
        }
    }
    Ok(())
}

// ============= Molecules =============

async fn molecules(ctx: &Context, cmd: MoleculeCommands) -> anyhow::Result<()> {
    let client = &ctx.client;
    match cmd {
        MoleculeCommands::List {
            project,
            limit,
            offset,
        } => {
            let list = ResourceList::new("molecules");
            let project = project.as_str();
            list.load(|| async move {
                api::molecules::list(client, project, limit, offset)
                    .await
                    .map(|page| page.molecules)
            })
            .await;
            if let Some(error) = list.error() {
                bail!(error);
            }

            ctx.out.header("Molecules");
            if list.is_empty() {
                ctx.out.info("No molecules in this project");
                return Ok(());
            }
            ctx.out.table_header(&[
                ("ID", 36),
                ("Name", 24),
                ("Type", 15),
                ("Format", 6),
                ("Atoms", 8),
                ("Frames", 6),
            ]);
            for molecule in list.items() {
                let atoms = molecule.n_atoms.to_string();
                let frames = molecule.n_frames.to_string();
                ctx.out.table_row(&[
                    (molecule.id.as_str(), 36),
                    (molecule.name.as_str(), 24),
                    (molecule.molecule_type.as_str(), 15),
                    (molecule.file_format.extension(), 6),
                    (atoms.as_str(), 8),
                    (frames.as_str(), 6),
                ]);
            }
        }
        MoleculeCommands::Show { id } => {
            let mut view = DetailView::new("molecule");
            view.load(api::molecules::get(client, &id)).await;
            if let Some(error) = view.error() {
                bail!(error.to_string());
            }
            let molecule = view
                .into_item()
                .ok_or_else(|| anyhow!("Molecule not found"))?;

            ctx.out.header(&molecule.name);
            ctx.out.kv("Id", &molecule.id);
            ctx.out.kv("Type", molecule.molecule_type.as_str());
            ctx.out.kv("Format", molecule.file_format.extension());
            ctx.out.kv("Atoms", &molecule.n_atoms.to_string());
            ctx.out.kv("Frames", &molecule.n_frames.to_string());
            if let Some(source) = &molecule.source_molecule_id {
                ctx.out.kv("Backmapped from", source);
            }
            if let Some(description) = &molecule.description {
                ctx.out.kv("Description", description);
            }
            if StructureFormat::from_file_format(molecule.file_format).is_some() {
                ctx.out
                    .hint(&format!("glimps molecules view {} opens it in 3D", molecule.id));
            }
        }
        MoleculeCommands::Upload {
            project,
            file,
            name,
            description,
            molecule_type,
        } => {
            let form = UploadMoleculeForm {
                project_id: project,
                file: Some(file),
                name,
                description,
                molecule_type,
            };
            let molecule = form.submit(client).await?;
            ctx.out.success(&format!(
                "Uploaded {} ({} atoms, {} frames)",
                molecule.name, molecule.n_atoms, molecule.n_frames
            ));
            ctx.out.kv("Id", &molecule.id);
        }
        MoleculeCommands::Delete { id, yes } => {
            if !yes && !ctx.out.confirm(&format!("Delete molecule {}?", id)) {
                ctx.out.info("Cancelled");
                return Ok(());
            }
            api::molecules::delete(client, &id).await?;
            ctx.out.success(&format!("Deleted molecule {}", id));
        }
        MoleculeCommands::Download { id, output } => {
            let structure = api::molecules::structure(client, &id).await?;
            let path = output.join(format!(
                "{}.{}",
                safe_file_name(&structure.name),
                structure.format
            ));
            tokio::fs::write(&path, structure.content.as_bytes())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            ctx.out.success(&format!("Saved {}", path.display()));
        }
        MoleculeCommands::View { id, page } => {
            let molecule = api::molecules::get(client, &id).await?;
            let format = StructureFormat::from_file_format(molecule.file_format).ok_or_else(|| {
                anyhow!(
                    "{} files cannot be shown in the 3D viewer, download the structure instead",
                    molecule.file_format
                )
            })?;
            let structure = api::molecules::structure(client, &id).await?;
            let input = ViewerInput::from_data(
                structure.content,
                StructureFormat::from_tag(&structure.format).unwrap_or(format),
                Some(molecule.molecule_type),
            );
            let path = render_page(ctx, input, &molecule.name, &page).await?;
            ctx.out.success(&format!("Wrote {}", path.display()));
        }
    }
    Ok(())
}

// ============= Models =============

async fn models(ctx: &Context, cmd: ModelCommands) -> anyhow::Result<()> {
    let client = &ctx.client;
    match cmd {
        ModelCommands::List {
            project,
            limit,
            offset,
        } => {
            let list = ResourceList::new("models");
            let project = project.as_str();
            list.load(|| async move {
                api::models::list(client, project, limit, offset)
                    .await
                    .map(|page| page.models)
            })
            .await;
            if let Some(error) = list.error() {
                bail!(error);
            }

            ctx.out.header("GLIMPS models");
            if list.is_empty() {
                ctx.out.info("No models in this project");
                return Ok(());
            }
            ctx.out
                .table_header(&[("ID", 36), ("Name", 24), ("Trained", 8), ("Created", 16)]);
            for model in list.items() {
                let created = model.created_at.format("%Y-%m-%d %H:%M").to_string();
                ctx.out.table_row(&[
                    (model.id.as_str(), 36),
                    (model.name.as_str(), 24),
                    (if model.is_trained { "yes" } else { "no" }, 8),
                    (created.as_str(), 16),
                ]);
            }
        }
        ModelCommands::Show { id } => {
            let mut view = DetailView::new("model");
            view.load(api::models::get(client, &id)).await;
            if let Some(error) = view.error() {
                bail!(error.to_string());
            }
            let model = view.into_item().ok_or_else(|| anyhow!("Model not found"))?;

            ctx.out.header(&model.name);
            ctx.out.kv("Id", &model.id);
            ctx.out.kv("Trained", if model.is_trained { "yes" } else { "no" });
            if let Some(trained_at) = model.trained_at {
                ctx.out
                    .kv("Trained at", &trained_at.format("%Y-%m-%d %H:%M").to_string());
            }
            if let Some(seconds) = model.training_duration_seconds {
                ctx.out.kv("Training time", &format!("{:.1}s", seconds));
            }
            if let Some(cg) = &model.cg_molecule_id {
                ctx.out.kv("Coarse-grained molecule", cg);
            }
            if let Some(atomistic) = &model.atomistic_molecule_id {
                ctx.out.kv("Atomistic molecule", atomistic);
            }
            if let Some(metrics) = &model.training_metrics {
                ctx.out.kv("Metrics", &serde_json::to_string_pretty(metrics)?);
            }
        }
        ModelCommands::Create {
            project,
            name,
            description,
        } => {
            let model = ModelForm {
                project_id: project,
                name,
                description,
            }
            .submit(client)
            .await?;
            ctx.out
                .success(&format!("Created model {} ({})", model.name, model.id));
            ctx.out.command(&format!(
                "glimps models train {} --cg <CG_ID> --atomistic <AA_ID>",
                model.id
            ));
        }
        ModelCommands::Train {
            id,
            cg,
            atomistic,
            pca,
            no_refine,
            no_shave,
            triangulate,
        } => {
            let form = TrainModelForm {
                cg_molecule_id: Some(cg),
                atomistic_molecule_id: Some(atomistic),
                options: GlimpsOptions {
                    pca,
                    refine: !no_refine,
                    shave: !no_shave,
                    triangulate,
                },
            };
            let started = form.submit(client, &id).await?;
            ctx.out
                .success(&format!("Training started (job {})", started.job_id));
            ctx.out.command(&format!("glimps jobs show {}", started.job_id));
        }
        ModelCommands::Infer { id, input } => {
            let molecule = api::molecules::get(client, &input).await?;
            if InferenceForm::candidates(std::slice::from_ref(&molecule)).is_empty() {
                bail!(
                    "Molecule {} is {}, only coarse-grained molecules can be backmapped",
                    molecule.name,
                    molecule.molecule_type
                );
            }
            let form = InferenceForm {
                input_molecule_id: Some(input),
            };
            let started = form.submit(client, &id).await?;
            ctx.out
                .success(&format!("Inference started (job {})", started.job_id));
            ctx.out.command("glimps jobs watch --until-done");
        }
        ModelCommands::Delete { id, yes } => {
            if !yes && !ctx.out.confirm(&format!("Delete model {}?", id)) {
                ctx.out.info("Cancelled");
                return Ok(());
            }
            api::models::delete(client, &id).await?;
            ctx.out.success(&format!("Deleted model {}", id));
        }
    }
    Ok(())
}

// ============= Jobs =============

fn job_filter(args: JobFilterArgs) -> JobFilter {
    JobFilter {
        project_id: args.project,
        status: args.status,
        limit: args.limit,
        offset: None,
    }
}

fn print_jobs(out: &Output, jobs: &[Job]) {
    if jobs.is_empty() {
        out.info("No jobs");
        return;
    }
    for job in jobs {
        out.job_row(job);
    }
}

async fn jobs(ctx: &Context, cmd: JobCommands) -> anyhow::Result<()> {
    let client = &ctx.client;
    match cmd {
        JobCommands::List { filter } => {
            let jobs = client.fetch_jobs(&job_filter(filter)).await?;
            ctx.out.header("Jobs");
            print_jobs(&ctx.out, &jobs);
        }
        JobCommands::Show { id } => {
            let job = api::jobs::get(client, &id).await?;
            ctx.out.header(&format!("{} job", job.job_type.label()));
            ctx.out.kv("Id", &job.id);
            ctx.out.kv("Status", job.status.as_str());
            ctx.out.kv("Progress", &progress_bar(job.progress_percent, 30));
            if let Some(message) = &job.progress_message {
                ctx.out.kv("Message", message);
            }
            if let Some(error) = &job.error_message {
                ctx.out.kv("Error", error);
            }
            if let Some(model) = &job.model_id {
                ctx.out.kv("Model", model);
            }
            if let Some(started) = job.started_at {
                ctx.out
                    .kv("Started", &started.format("%Y-%m-%d %H:%M:%S").to_string());
            }
            if let Some(completed) = job.completed_at {
                ctx.out
                    .kv("Completed", &completed.format("%Y-%m-%d %H:%M:%S").to_string());
            }
            if let Some(output) = &job.output_params {
                ctx.out.kv("Output", &serde_json::to_string_pretty(output)?);
            }
        }
        JobCommands::Cancel { id } => {
            let job = api::jobs::get(client, &id).await?;
            if !job.status.is_cancellable() {
                bail!("Job {} is already {}", job.id, job.status.as_str());
            }
            api::jobs::cancel(client, &id).await?;
            ctx.out.success(&format!("Cancelled job {}", id));
        }
        JobCommands::Watch { filter, until_done } => {
            watch_jobs(ctx, job_filter(filter), until_done).await?;
        }
        JobCommands::Download { id, output } => {
            let path = api::jobs::download_result(client, &id, &output).await?;
            ctx.out.success(&format!("Saved {}", path.display()));
        }
        JobCommands::CreateMolecule { id, name } => {
            let molecule = api::jobs::create_molecule(client, &id, name.as_deref()).await?;
            ctx.out.success(&format!(
                "Created backmapped molecule {} ({})",
                molecule.name, molecule.id
            ));
        }
    }
    Ok(())
}

async fn watch_jobs(ctx: &Context, filter: JobFilter, until_done: bool) -> anyhow::Result<()> {
    let feed: Arc<dyn JobFeed> = ctx.client.clone();
    let mut poller = JobPoller::spawn(feed, filter, ctx.config.poller_config());
    let mut rx = poller.subscribe();

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                print_watch(&ctx.out, &state);
                if let Some(error) = &state.error {
                    if state.consecutive_failures >= 3 {
                        poller.stop();
                        bail!(error.clone());
                    }
                }
                let finished = state.jobs.iter().all(|job| job.status.is_terminal());
                if until_done && !state.loading && state.error.is_none() && finished {
                    ctx.out.success("All jobs finished");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    poller.stop();
    Ok(())
}

fn print_watch(out: &Output, state: &JobListState) {
    out.header(&format!("Jobs at {}", chrono::Local::now().format("%H:%M:%S")));
    if let Some(error) = &state.error {
        out.error(error);
        return;
    }
    if state.consecutive_failures > 0 {
        out.warning(&format!(
            "Last {} refreshes failed, showing the previous list",
            state.consecutive_failures
        ));
    }
    print_jobs(out, &state.jobs);
}

// ============= Viewer =============

async fn view_source(ctx: &Context, args: ViewArgs) -> anyhow::Result<()> {
    let path = Path::new(&args.source);
    let format = args
        .format
        .or_else(|| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .and_then(FileFormat::from_extension)
                .and_then(StructureFormat::from_file_format)
        })
        .unwrap_or_default();

    let is_remote = args.source.starts_with("http://") || args.source.starts_with("https://");
    let input = if is_remote {
        ViewerInput::from_url(args.source.clone(), format, args.molecule_type)
    } else {
        let data = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        ViewerInput::from_data(data, format, args.molecule_type)
    };

    let title = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("structure")
        .to_string();
    let written = render_page(ctx, input, &title, &args.page).await?;
    ctx.out.success(&format!("Wrote {}", written.display()));
    Ok(())
}

/// Drive a viewer over `input` and write the resulting scene as HTML.
async fn render_page(
    ctx: &Context,
    input: ViewerInput,
    title: &str,
    page: &PageArgs,
) -> anyhow::Result<PathBuf> {
    let output = page
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.html", safe_file_name(title))));

    let loader = Arc::new(CapabilityLoader::new());
    let source = HttpStructureSource::with_timeout(Duration::from_secs(ctx.config.api.timeout_secs))?;
    let viewer = StructureViewer::new(
        loader.clone(),
        Arc::new(source),
        Arc::new(MemoryContainer::new()),
        ctx.config.engine_options(),
    );
    let store = ViewerStore::global();
    store.mirror(&viewer.state());

    // The viewer waits for the library while it is fetched.
    let pending = viewer.set_input(input);
    let library_url = ctx.config.viewer.library_url.clone();
    let scene = if page.inline {
        HtmlSceneCapability::download(&reqwest::Client::new(), &library_url).await
    } else {
        Ok(HtmlSceneCapability::remote(library_url))
    };
    let scene = match scene {
        Ok(scene) => {
            let scene = Arc::new(scene);
            loader.resolve(scene.clone());
            Some(scene)
        }
        Err(e) => {
            loader.fail(e.detail());
            None
        }
    };

    pending.await?;
    let state = viewer.state();
    store.mirror(&state);

    match &state {
        ViewerState::Ready { rendered: true } => {}
        ViewerState::Ready { rendered: false } => bail!("Nothing to show, the structure is empty"),
        ViewerState::Loading => bail!("The viewer did not finish loading"),
        ViewerState::Error(message) => {
            if let Some(notice) = state.notice() {
                ctx.out.viewer_notice(&notice);
            }
            bail!(message.clone());
        }
    }

    let document = match (scene, viewer.attached_node()) {
        (Some(scene), Some(node)) => scene.document(node, title),
        _ => None,
    }
    .ok_or_else(|| anyhow!("The rendered scene is no longer available"))?;

    tokio::fs::write(&output, document)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    viewer.unmount();
    Ok(output)
}

fn safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "structure".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("Lysozyme (CG)"), "Lysozyme__CG_");
        assert_eq!(safe_file_name("../etc/passwd"), ".._etc_passwd");
        assert_eq!(safe_file_name("   "), "structure");
    }

    #[test]
    fn test_job_filter_from_args() {
        let filter = job_filter(JobFilterArgs {
            project: Some("p".to_string()),
            status: None,
            limit: Some(10),
        });
        assert_eq!(filter.project_id.as_deref(), Some("p"));
        assert_eq!(filter.limit, Some(10));
        assert!(filter.offset.is_none());
    }
}
