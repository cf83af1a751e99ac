use aula::Result;
use aula::commands::{
    add_course, add_exam_question, add_user, chat_turn, create_exam, delete_document, grade_exam,
    ingest_document, list_courses, list_documents, mark_video_watched, publish_course,
    set_ai_config, show_ai_config, show_history,
};
use aula::config::{run_interactive_config, show_config};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "aula")]
#[command(about = "Course platform backend with a RAG document pipeline and AI assistant")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the model provider and chunking settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Manage courses
    Course {
        #[command(subcommand)]
        command: CourseCommands,
    },
    /// Ingest a document into a course's retrieval collection
    Ingest {
        /// Course to attach the document to
        #[arg(long)]
        course: i64,
        /// Document title shown to students
        #[arg(long)]
        title: String,
        /// Local path or URL of the document
        #[arg(long)]
        file: String,
        /// Media type; inferred from the file extension when omitted
        #[arg(long)]
        mime: Option<String>,
        /// Acting user (must be an admin)
        #[arg(long)]
        user: i64,
    },
    /// List a course's ingested documents
    Docs {
        #[arg(long)]
        course: i64,
    },
    /// Delete an ingested document
    DeleteDoc {
        /// Document ID to delete
        id: i64,
        #[arg(long)]
        course: i64,
        /// Acting user (must be an admin)
        #[arg(long)]
        user: i64,
    },
    /// Ask the course assistant a question
    Chat {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        course: i64,
        message: String,
    },
    /// Show chat history for a user and course
    History {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        course: i64,
    },
    /// Manage per-course AI configuration
    AiConfig {
        #[command(subcommand)]
        command: AiConfigCommands,
    },
    /// Manage exams
    Exam {
        #[command(subcommand)]
        command: ExamCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a user
    Add {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Grant the admin role
        #[arg(long)]
        admin: bool,
    },
}

#[derive(Subcommand)]
enum CourseCommands {
    /// Create a course
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        video_url: Option<String>,
        #[arg(long)]
        transcript: Option<String>,
        #[arg(long)]
        prerequisites: Option<String>,
        /// Acting user (must be an admin)
        #[arg(long)]
        user: i64,
    },
    /// List courses
    List {
        /// Include unpublished courses
        #[arg(long)]
        all: bool,
    },
    /// Publish a course
    Publish {
        course_id: i64,
        /// Acting user (must be an admin)
        #[arg(long)]
        user: i64,
    },
    /// Record that a student watched the course video
    Watched {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        course: i64,
    },
}

#[derive(Subcommand)]
enum AiConfigCommands {
    /// Show the stored configuration for a course
    Show {
        #[arg(long)]
        course: i64,
    },
    /// Create or update the configuration for a course
    Set {
        #[arg(long)]
        course: i64,
        #[arg(long)]
        system_prompt: Option<String>,
        /// Sampling temperature between 0.0 and 2.0
        #[arg(long)]
        temperature: Option<f64>,
        /// Output token budget between 100 and 4000
        #[arg(long)]
        max_tokens: Option<i64>,
        /// Acting user (must be an admin)
        #[arg(long)]
        user: i64,
    },
}

#[derive(Subcommand)]
enum ExamCommands {
    /// Create an exam for a course
    Create {
        #[arg(long)]
        course: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        passing_score: Option<f64>,
        /// Acting user (must be an admin)
        #[arg(long)]
        user: i64,
    },
    /// Add a question to an exam
    AddQuestion {
        #[arg(long)]
        exam: i64,
        #[arg(long)]
        question: String,
        /// multiple_choice, short_answer, or essay
        #[arg(long, default_value = "multiple_choice")]
        question_type: String,
        /// JSON-encoded answer options
        #[arg(long)]
        options: Option<String>,
        #[arg(long)]
        answer: Option<String>,
        #[arg(long, default_value_t = 1)]
        points: i64,
        /// Acting user (must be an admin)
        #[arg(long)]
        user: i64,
    },
    /// Grade an answer set, e.g. --answer 1=A --answer 2=B
    Grade {
        #[arg(long)]
        exam: i64,
        #[arg(long)]
        user: i64,
        #[arg(long = "answer")]
        answers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::User { command } => match command {
            UserCommands::Add { name, email, admin } => {
                add_user(name, email, admin).await?;
            }
        },
        Commands::Course { command } => match command {
            CourseCommands::Add {
                title,
                description,
                video_url,
                transcript,
                prerequisites,
                user,
            } => {
                add_course(user, title, description, video_url, transcript, prerequisites).await?;
            }
            CourseCommands::List { all } => {
                list_courses(all).await?;
            }
            CourseCommands::Publish { course_id, user } => {
                publish_course(user, course_id).await?;
            }
            CourseCommands::Watched { user, course } => {
                mark_video_watched(user, course).await?;
            }
        },
        Commands::Ingest {
            course,
            title,
            file,
            mime,
            user,
        } => {
            ingest_document(user, course, title, file, mime).await?;
        }
        Commands::Docs { course } => {
            list_documents(course).await?;
        }
        Commands::DeleteDoc { id, course, user } => {
            delete_document(user, id, course).await?;
        }
        Commands::Chat { user, course, message } => {
            chat_turn(user, course, message).await?;
        }
        Commands::History { user, course } => {
            show_history(user, course).await?;
        }
        Commands::AiConfig { command } => match command {
            AiConfigCommands::Show { course } => {
                show_ai_config(course).await?;
            }
            AiConfigCommands::Set {
                course,
                system_prompt,
                temperature,
                max_tokens,
                user,
            } => {
                set_ai_config(user, course, system_prompt, temperature, max_tokens).await?;
            }
        },
        Commands::Exam { command } => match command {
            ExamCommands::Create {
                course,
                title,
                description,
                passing_score,
                user,
            } => {
                create_exam(user, course, title, description, passing_score).await?;
            }
            ExamCommands::AddQuestion {
                exam,
                question,
                question_type,
                options,
                answer,
                points,
                user,
            } => {
                add_exam_question(user, exam, question, question_type, options, answer, points)
                    .await?;
            }
            ExamCommands::Grade { exam, user, answers } => {
                grade_exam(user, exam, answers).await?;
            }
        },
    }

    Ok(())
}
