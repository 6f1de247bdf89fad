use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the quillhub binary.
#[derive(Debug, Parser)]
#[command(
    name = "quillhub",
    version,
    about = "Administer the quillhub content store"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "QUILLHUB_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Apply pending database migrations.
    Migrate,
    /// Manage user references.
    #[command(subcommand)]
    User(UserCommand),
    /// Manage groups.
    #[command(subcommand)]
    Group(GroupCommand),
    /// Create, show and list posts.
    #[command(subcommand)]
    Post(PostCommand),
    /// Comment on posts.
    #[command(subcommand)]
    Comment(CommentCommand),
}

#[derive(Debug, Subcommand, Clone)]
pub enum UserCommand {
    /// Register a username.
    Create {
        #[arg(value_name = "USERNAME")]
        username: String,
    },
    /// Delete a user together with their posts, comments and follows.
    Delete {
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Subscribe USER to the posts of AUTHOR.
    Follow {
        #[arg(value_name = "USER")]
        user: String,
        #[arg(value_name = "AUTHOR")]
        author: String,
    },
    Unfollow {
        #[arg(value_name = "USER")]
        user: String,
        #[arg(value_name = "AUTHOR")]
        author: String,
    },
    /// Posts by everyone USER follows.
    Feed {
        #[arg(value_name = "USER")]
        user: String,
        #[arg(long)]
        page: Option<String>,
    },
}

#[derive(Debug, Subcommand, Clone)]
pub enum GroupCommand {
    Create(GroupCreateArgs),
    /// Delete a group that no post references.
    Delete {
        #[arg(value_name = "ID")]
        id: i64,
    },
    List,
}

#[derive(Debug, Args, Clone)]
pub struct GroupCreateArgs {
    #[arg(long)]
    pub title: String,

    /// Derived from the title when omitted.
    #[arg(long, default_value = "")]
    pub slug: String,

    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(Debug, Subcommand, Clone)]
pub enum PostCommand {
    Create(PostCreateArgs),
    /// Show a post with its comments.
    Show {
        #[arg(value_name = "ID")]
        id: i64,
    },
    List(PostListArgs),
}

#[derive(Debug, Subcommand, Clone)]
pub enum CommentCommand {
    Add {
        #[arg(long)]
        post: i64,
        /// Username of the commenter.
        #[arg(long)]
        author: String,
        #[arg(long)]
        text: String,
    },
}

#[derive(Debug, Args, Clone)]
pub struct PostCreateArgs {
    /// Username of the author.
    #[arg(long)]
    pub author: String,

    #[arg(long)]
    pub text: String,

    /// Slug of the group to post into.
    #[arg(long)]
    pub group: Option<String>,

    /// Image file to attach.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub image: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct PostListArgs {
    /// Only posts in this group.
    #[arg(long, conflicts_with = "author")]
    pub group: Option<String>,

    /// Only posts by this username.
    #[arg(long)]
    pub author: Option<String>,

    /// Page number; anything that is not a number means the first page.
    #[arg(long)]
    pub page: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL", global = true)]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT", global = true)]
    pub database_max_connections: Option<u32>,

    /// Override the number of posts per page.
    #[arg(long = "per-page", value_name = "COUNT", global = true)]
    pub per_page: Option<u64>,

    /// Override the media directory.
    #[arg(
        long = "media-directory",
        value_name = "PATH",
        value_hint = ValueHint::DirPath,
        global = true
    )]
    pub media_directory: Option<PathBuf>,
}
