//! DeciFrame API Server
//!
//! Main entry point for the DeciFrame backend service. Wires the database,
//! the workflow engine, the scheduler, and the HTTP router together, and
//! tears the background tasks down on shutdown.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deciframe_api::{create_router, AppState, RequestMetrics};
use deciframe_db::{
    connect, AuditRepository, BusinessCaseRepository, DelayedJobRepository,
    NotificationRepository, OrganizationRepository, ProjectRepository, ReportDataRepository,
    ReportRepository, UserRepository, WorkflowRepository,
};
use deciframe_engine::{
    build_registry, ActionServices, EventQueue, Mailer, NotificationDispatcher, ReportPipeline,
    Scheduler, Triggers, WorkflowProcessor,
};
use deciframe_shared::{AppConfig, EmailService, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deciframe=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");
    let settings = config.app.clone();

    // Connect to database
    let db = connect(
        &config.database.url,
        config.database.max_connections,
        config.database.recycle_secs,
    )
    .await?;
    info!("Connected to database");

    // Create JWT service
    let jwt = Arc::new(JwtService::new(JwtConfig {
        secret: config.auth.secret.clone(),
        session_hours: config.auth.session_hours,
    }));

    // Outbound email is optional; without it, in-app delivery still works.
    let mailer: Option<Arc<dyn Mailer>> = match config.email.clone() {
        Some(email) => {
            info!(
                smtp_host = %email.smtp_host,
                smtp_port = email.smtp_port,
                "Email service configured"
            );
            Some(Arc::new(EmailService::new(email)))
        }
        None => {
            warn!("No email configuration; outbound email disabled");
            None
        }
    };

    let timezone: chrono_tz::Tz = settings.default_timezone.parse().unwrap_or_else(|_| {
        warn!(
            timezone = %settings.default_timezone,
            "Unknown timezone, scheduler falls back to UTC"
        );
        chrono_tz::UTC
    });

    // Repositories
    let users = UserRepository::new(db.clone());
    let organizations = OrganizationRepository::new(db.clone());
    let cases = BusinessCaseRepository::new(db.clone());
    let projects = ProjectRepository::new(db.clone());
    let notifications = NotificationRepository::new(db.clone());
    let workflows = WorkflowRepository::new(db.clone());
    let audit = AuditRepository::new(db.clone());
    let jobs = DelayedJobRepository::new(db.clone());
    let reports = ReportRepository::new(db.clone());
    let report_data = ReportDataRepository::new(db.clone());

    // Notification delivery, shared by action handlers and the scheduler.
    let dispatcher = NotificationDispatcher::new(
        notifications.clone(),
        users.clone(),
        projects.clone(),
        jobs.clone(),
        mailer.clone(),
        settings.milestone_due_soon_days,
    );

    // Workflow engine: action registry, bounded queue, worker.
    let registry = Arc::new(build_registry(Arc::new(ActionServices {
        users: users.clone(),
        cases,
        notifications,
        audit: audit.clone(),
        jobs,
        dispatcher: dispatcher.clone(),
        full_case_threshold: settings.full_case_threshold,
    })));
    let (queue, worker) = EventQueue::bounded(settings.event_queue_capacity);
    let processor = Arc::new(WorkflowProcessor::new(workflows, audit, registry.clone()));

    let cancel = CancellationToken::new();
    let worker_task = tokio::spawn(worker.run(processor, cancel.clone()));

    // Report pipeline and the scheduler driving it.
    let pipeline = ReportPipeline::new(
        reports.clone(),
        report_data,
        users,
        mailer,
        settings.reports_dir.clone(),
    );
    let scheduler = Scheduler::new(
        organizations,
        reports,
        dispatcher,
        pipeline.clone(),
        Arc::new(queue.clone()),
        timezone,
    );
    let scheduler_task = tokio::spawn(scheduler.run(cancel.clone()));

    // Create application state
    let state = AppState {
        db,
        jwt,
        settings,
        triggers: Triggers::new(Arc::new(queue.clone())),
        queue,
        registry,
        pipeline,
        metrics: RequestMetrics::default(),
    };
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the worker and scheduler; the worker finishes its in-flight event.
    info!("Shutting down background tasks");
    cancel.cancel();
    let _ = worker_task.await;
    let _ = scheduler_task.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
