use std::{path::Path, process, sync::Arc};

use bytes::Bytes;
use quillhub::{
    application::{
        comments::CommentService,
        error::AppError,
        feed::FeedService,
        follows::FollowService,
        groups::{CreateGroupCommand, GroupService},
        pagination::{PageNumber, Paginator},
        posts::{CreatePostCommand, PostService},
        users::UserService,
    },
    cache::{PageCache, PageCacheConfig},
    config::{
        self, Command, CommentCommand, GroupCommand, PostCommand, PostCreateArgs, PostListArgs,
        UserCommand,
    },
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        media::{MediaError, MediaStorage},
        telemetry,
    },
};
use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let repositories = init_repositories(&settings).await?;
    if matches!(cli_args.command, Command::Migrate) {
        info!(target = "quillhub::migrate", "Migrations applied");
        return Ok(());
    }

    let app = Application::new(repositories, &settings);

    match cli_args.command {
        Command::Migrate => Ok(()),
        Command::User(command) => run_user(&app, command).await,
        Command::Group(command) => run_group(&app, command).await,
        Command::Post(PostCommand::Create(args)) => {
            let media = MediaStorage::new(settings.media.directory.clone())
                .map_err(InfraError::from)?;
            run_post_create(&app, &media, args).await
        }
        Command::Post(PostCommand::Show { id }) => print_json(&app.posts.post_detail(id).await?),
        Command::Post(PostCommand::List(args)) => run_post_list(&app, args).await,
        Command::Comment(CommentCommand::Add { post, author, text }) => {
            let author = app.users.find_by_username(&author).await?;
            print_json(&app.comments.add_comment(post, author.id, &text).await?)
        }
    }
}

struct Application {
    users: UserService,
    groups: GroupService,
    posts: PostService,
    comments: CommentService,
    follows: FollowService,
    feed: FeedService,
}

impl Application {
    fn new(repositories: Arc<PostgresRepositories>, settings: &config::Settings) -> Self {
        let index_cache = Arc::new(PageCache::new(&PageCacheConfig::from(&settings.cache)));
        let paginator = Paginator::new(settings.pagination.per_page);

        Self {
            users: UserService::new(repositories.clone(), repositories.clone()),
            groups: GroupService::new(repositories.clone(), repositories.clone()),
            posts: PostService::new(
                repositories.clone(),
                repositories.clone(),
                repositories.clone(),
            ),
            comments: CommentService::new(repositories.clone(), repositories.clone()),
            follows: FollowService::new(
                repositories.clone(),
                repositories.clone(),
                repositories.clone(),
            ),
            feed: FeedService::new(
                repositories.clone(),
                repositories.clone(),
                repositories.clone(),
                repositories,
                paginator,
                index_cache,
            ),
        }
    }
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn run_user(app: &Application, command: UserCommand) -> Result<(), AppError> {
    match command {
        UserCommand::Create { username } => print_json(&app.users.register(&username).await?),
        UserCommand::Delete { id } => print_json(&app.users.delete_user(id).await?),
        UserCommand::Follow { user, author } => {
            let user = app.users.find_by_username(&user).await?;
            print_json(&app.follows.follow_username(user.id, &author).await?)
        }
        UserCommand::Unfollow { user, author } => {
            let user = app.users.find_by_username(&user).await?;
            app.follows.unfollow_username(user.id, &author).await?;
            info!(
                target = "quillhub::user::unfollow",
                user = %user.username,
                author = %author,
                "Unfollowed"
            );
            Ok(())
        }
        UserCommand::Feed { user, page } => {
            let user = app.users.find_by_username(&user).await?;
            let page = PageNumber::parse(page.as_deref());
            print_json(&app.feed.list_followed_posts(user.id, page).await?)
        }
    }
}

async fn run_group(app: &Application, command: GroupCommand) -> Result<(), AppError> {
    match command {
        GroupCommand::Create(args) => {
            let group = app
                .groups
                .create_group(CreateGroupCommand {
                    title: args.title,
                    slug: args.slug,
                    description: args.description,
                })
                .await?;
            print_json(&group)
        }
        GroupCommand::Delete { id } => print_json(&app.groups.delete_group(id).await?),
        GroupCommand::List => print_json(&app.groups.list_groups().await?),
    }
}

async fn run_post_create(
    app: &Application,
    media: &MediaStorage,
    args: PostCreateArgs,
) -> Result<(), AppError> {
    let author = app.users.find_by_username(&args.author).await?;
    let group_id = match args.group.as_deref() {
        Some(slug) => Some(app.groups.find_by_slug(slug).await?.id),
        None => None,
    };

    let image = match args.image.as_deref() {
        Some(path) => Some(store_image(media, path).await?),
        None => None,
    };

    let result = app
        .posts
        .create_post(CreatePostCommand {
            author_id: author.id,
            text: args.text,
            group_id,
            image: image.clone(),
        })
        .await;

    match result {
        Ok(post) => print_json(&post),
        Err(err) => {
            if let Some(reference) = image
                && let Err(cleanup) = media.delete(&reference).await
            {
                warn!(
                    target = "quillhub::post::create",
                    reference = %reference,
                    error = %cleanup,
                    "failed to remove image of rejected post"
                );
            }
            Err(err.into())
        }
    }
}

async fn store_image(media: &MediaStorage, path: &Path) -> Result<String, AppError> {
    let data = tokio::fs::read(path).await.map_err(InfraError::from)?;
    let name = path
        .file_name()
        .and_then(|value| value.to_str())
        .unwrap_or_default();

    let stored = media
        .store(name, Bytes::from(data))
        .await
        .map_err(media_error)?;
    info!(
        target = "quillhub::post::create",
        reference = %stored.reference,
        checksum = %stored.checksum,
        width = stored.width,
        height = stored.height,
        "image attached"
    );
    Ok(stored.reference)
}

fn media_error(error: MediaError) -> AppError {
    match error {
        MediaError::Io(err) => AppError::from(InfraError::from(err)),
        MediaError::NameExhausted { .. } | MediaError::InvalidPath => {
            AppError::unexpected(error.to_string())
        }
        other => AppError::validation(other.to_string()),
    }
}

async fn run_post_list(app: &Application, args: PostListArgs) -> Result<(), AppError> {
    let page = PageNumber::parse(args.page.as_deref());

    if let Some(slug) = args.group.as_deref() {
        return print_json(&app.feed.list_posts_by_group(slug, page).await?);
    }
    if let Some(username) = args.author.as_deref() {
        return print_json(&app.feed.list_posts_by_author(username, page).await?);
    }
    print_json(&app.feed.index(page).await?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
