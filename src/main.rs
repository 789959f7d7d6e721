//! NovelGen - 小说生成控制面板（命令行）
//!
//! 每个子命令对应面板上的一个操作，控制器发布的事件直接打印到终端。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;

use novelgen::application::commands::{
    GenerationOptions, ManualUpdateState, StartBatchGeneration,
};
use novelgen::application::managers::{
    BatchGenerator, BatchGeneratorConfig, BatchTermination, SettingsManager, Tab, TabManager,
    TabReload, TemplateManager,
};
use novelgen::application::ports::{NovelApiPort, PanelEvent, PanelEventSink};
use novelgen::config::{load_config, load_config_from_path, print_config, AppConfig};
use novelgen::domain::settings::SettingsKind;
use novelgen::domain::template::TemplateForm;
use novelgen::infrastructure::adapters::{FakeNovelApi, HttpNovelApiClient};
use novelgen::infrastructure::events::EventPublisher;

#[derive(Parser)]
#[command(name = "novelgen", version, about = "小说生成控制面板")]
struct Cli {
    /// 配置文件路径（默认搜索 novelgen.toml / novelgen.local.toml）
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// 使用内存后端，不连接 API
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 检查后端连接
    Health,
    /// 切换面板并显示重新加载的数据
    Tab { tab: Tab },
    /// 模版管理
    #[command(subcommand)]
    Templates(TemplateCommand),
    /// 检测小说当前进度
    Progress { novel_id: String },
    /// 批量生成章节（Ctrl-C 在当前章完成后停止）
    Generate(GenerateArgs),
    /// 基于最新章节手动更新角色状态
    UpdateState {
        #[arg(long = "novel")]
        novel_id: String,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        update_model: Option<String>,
    },
    /// 设定版本管理
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand)]
enum TemplateCommand {
    /// 列出全部模版
    List,
    /// 显示模版及其提示词
    Show { id: String },
    /// 显示新模版的 ID
    New,
    /// 保存模版
    Save(TemplateArgs),
    /// 预览模版，不发请求
    Preview(TemplateArgs),
}

#[derive(Args)]
struct TemplateArgs {
    #[arg(long)]
    id: String,
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    category: String,
    #[arg(long, default_value = "")]
    min_words: String,
    #[arg(long, default_value = "")]
    max_words: String,
    /// 写手角色提示词文件
    #[arg(long)]
    writer_role: Option<PathBuf>,
    /// 写作规则提示词文件
    #[arg(long)]
    writing_rules: Option<PathBuf>,
    /// 状态更新规则提示词文件
    #[arg(long)]
    update_state_rules: Option<PathBuf>,
}

impl TemplateArgs {
    async fn into_form(self) -> anyhow::Result<TemplateForm> {
        Ok(TemplateForm {
            id: self.id,
            name: self.name,
            category: self.category,
            min_words: self.min_words,
            max_words: self.max_words,
            writer_role: read_optional(self.writer_role.as_ref()).await?,
            writing_rules: read_optional(self.writing_rules.as_ref()).await?,
            update_state_rules: read_optional(self.update_state_rules.as_ref()).await?,
        })
    }
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(long = "novel")]
    novel_id: String,
    #[arg(long = "template")]
    template_id: String,
    #[arg(long = "count")]
    chapter_count: Option<u32>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    update_model: Option<String>,
    #[arg(long)]
    no_state: bool,
    #[arg(long)]
    no_world_bible: bool,
    #[arg(long)]
    no_update_state: bool,
    #[arg(long)]
    no_previous_chapters: bool,
    #[arg(long)]
    previous_chapters: Option<u32>,
}

impl GenerateArgs {
    fn into_command(self, config: &AppConfig) -> StartBatchGeneration {
        let mut options = GenerationOptions::from(&config.generation);
        if let Some(model) = self.model {
            options.model_name = model;
        }
        if self.update_model.is_some() {
            options.update_model_name = self.update_model;
        }
        options.use_state &= !self.no_state;
        options.use_world_bible &= !self.no_world_bible;
        options.update_state &= !self.no_update_state;
        options.use_previous_chapters &= !self.no_previous_chapters;
        if self.previous_chapters.is_some() {
            options.previous_chapters_count = self.previous_chapters;
        }

        StartBatchGeneration {
            novel_id: self.novel_id,
            template_id: self.template_id,
            chapter_count: self.chapter_count,
            options,
        }
    }
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// 加载小说设定并显示最新版本
    Show { novel_id: String },
    /// 显示指定版本
    Get {
        novel_id: String,
        kind: SettingsKind,
        version: String,
    },
    /// 以文件内容创建新版本
    New {
        novel_id: String,
        kind: SettingsKind,
        #[arg(long)]
        file: PathBuf,
    },
    /// 以文件内容覆盖指定版本（缺省为最新版本）
    Save {
        novel_id: String,
        kind: SettingsKind,
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        file: PathBuf,
    },
}

async fn read_optional(path: Option<&PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => Ok(String::new()),
    }
}

/// 四个控制器
struct Controllers {
    tabs: TabManager,
    templates: Arc<TemplateManager>,
    batch: Arc<BatchGenerator>,
    settings: SettingsManager,
}

impl Controllers {
    fn new(
        api: Arc<dyn NovelApiPort>,
        events: Arc<dyn PanelEventSink>,
        config: &AppConfig,
    ) -> Self {
        let templates = Arc::new(TemplateManager::new(api.clone(), events.clone()));
        let batch = Arc::new(BatchGenerator::new(
            api.clone(),
            events.clone(),
            BatchGeneratorConfig::from(&config.batch),
        ));
        let settings = SettingsManager::new(api, events);
        let tabs = TabManager::new(templates.clone(), batch.clone());
        Self {
            tabs,
            templates,
            batch,
            settings,
        }
    }
}

fn init_tracing(config: &AppConfig) {
    let log_filter = format!("warn,novelgen={}", config.log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// 把面板事件打印到终端
fn spawn_event_printer(events: &EventPublisher) -> tokio::task::JoinHandle<()> {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(PanelEvent::Log(entry)) => println!("{}", entry),
                Ok(PanelEvent::Status { message, .. }) => println!("» {}", message),
                Ok(PanelEvent::Progress(progress)) => println!("{}", progress),
                Ok(PanelEvent::Notice { message, .. }) => println!("! {}", message),
                Ok(PanelEvent::StatusCleared { .. }) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event printer lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = match &cli.config {
        Some(path) => load_config_from_path(Some(path)),
        None => load_config(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);
    print_config(&config);

    let api: Arc<dyn NovelApiPort> = if cli.offline {
        tracing::info!("Offline mode, using in-memory backend");
        Arc::new(FakeNovelApi::with_demo_data().await)
    } else {
        Arc::new(HttpNovelApiClient::new(config.api.client_config())?)
    };

    let events = Arc::new(EventPublisher::new());
    let printer = spawn_event_printer(&events);

    let healthy = api.health_check().await;
    if !healthy {
        eprintln!("API连接失败");
    }

    let controllers = Controllers::new(api, events.clone(), &config);
    let result = run(cli.command, &controllers, &config, healthy).await;

    // 剩余事件打印完再退出
    drop(controllers);
    drop(events);
    let _ = tokio::time::timeout(Duration::from_millis(500), printer).await;

    result
}

async fn run(
    command: Command,
    app: &Controllers,
    config: &AppConfig,
    healthy: bool,
) -> anyhow::Result<()> {
    match command {
        Command::Health => {
            if healthy {
                println!("API连接正常");
            } else {
                anyhow::bail!("API连接失败");
            }
        }

        Command::Tab { tab } => match app.tabs.switch_to(tab).await? {
            TabReload::Templates(store) => {
                for template in store.iter() {
                    println!("{} ({})", template.name, template.id);
                }
            }
            TabReload::GenerationTemplates(options) => {
                for option in options {
                    println!("{}", option.label);
                }
            }
            TabReload::None => println!("已切换到 {}", app.tabs.active().await),
        },

        Command::Templates(command) => run_templates(command, app).await?,

        Command::Progress { novel_id } => {
            let report = app.batch.detect_progress(&novel_id).await?;
            println!("{}", report);
        }

        Command::Generate(args) => {
            let command = args.into_command(config);

            let stopper = app.batch.clone();
            let ctrl_c = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    stopper.stop_batch_generation();
                }
            });

            let generator = app.batch.clone();
            let report =
                tokio::spawn(async move { generator.start_batch_generation(command).await })
                    .await?;
            ctrl_c.abort();
            let report = report?;
            if let BatchTermination::Stopped { next_chapter } = report.termination {
                println!("已停止，第 {} 章未开始", next_chapter);
            }

            println!(
                "完成 {}/{} 章（从第 {} 章开始）",
                report.completed(),
                report.requested,
                report.start_chapter
            );
            if let BatchTermination::Failed { chapter, reason } = report.termination {
                anyhow::bail!("第 {} 章生成失败: {}", chapter, reason);
            }
        }

        Command::UpdateState {
            novel_id,
            model,
            update_model,
        } => {
            let command = ManualUpdateState {
                novel_id,
                model_name: model.unwrap_or_else(|| config.generation.model_name.clone()),
                update_model_name: update_model
                    .or_else(|| config.generation.update_model_name.clone()),
            };
            let summary = app.batch.manual_update_state(command).await?;
            println!("{}", summary);
        }

        Command::Settings(command) => run_settings(command, app).await?,
    }

    Ok(())
}

async fn run_templates(command: TemplateCommand, app: &Controllers) -> anyhow::Result<()> {
    match command {
        TemplateCommand::List => {
            app.templates.load_templates().await?;
            for option in app.templates.template_options().await {
                println!("{}", option.label);
            }
        }
        TemplateCommand::Show { id } => {
            app.templates.load_templates().await?;
            let selection = app
                .templates
                .select_template(&id)
                .await
                .with_context(|| format!("模版不存在: {}", id))?;
            if let Some(info) = selection.info {
                println!("{}", info);
            }
            let form = selection.form;
            println!("\n[写手角色]\n{}", form.writer_role);
            println!("\n[写作规则]\n{}", form.writing_rules);
            println!("\n[状态更新规则]\n{}", form.update_state_rules);
        }
        TemplateCommand::New => {
            app.templates.load_templates().await?;
            let form = app.templates.new_template().await;
            println!("{}", form.id);
        }
        TemplateCommand::Save(args) => {
            let form = args.into_form().await?;
            let template = app.templates.save_template(&form).await?;
            println!("{} ({})", template.name, template.id);
        }
        TemplateCommand::Preview(args) => {
            let form = args.into_form().await?;
            println!("{}", app.templates.preview_template(&form)?);
        }
    }
    Ok(())
}

async fn run_settings(command: SettingsCommand, app: &Controllers) -> anyhow::Result<()> {
    match command {
        SettingsCommand::Show { novel_id } => {
            let overview = app.settings.load_settings(&novel_id).await?;
            for kind in SettingsKind::ALL {
                println!("\n[{}]", kind.label());
                for version in overview.versions(kind) {
                    println!("  {}", version.label(kind));
                }
                if let Some(loaded) = overview.loaded(kind) {
                    println!("{}", loaded.pretty);
                }
            }
        }
        SettingsCommand::Get {
            novel_id,
            kind,
            version,
        } => {
            app.settings.load_settings(&novel_id).await?;
            match app.settings.load_version(kind, &version).await? {
                Some(loaded) => println!("{}", loaded.pretty),
                None => println!("未选择版本"),
            }
        }
        SettingsCommand::New {
            novel_id,
            kind,
            file,
        } => {
            let content = read_optional(Some(&file)).await?;
            app.settings.load_settings(&novel_id).await?;
            let loaded = match kind {
                SettingsKind::Character => {
                    app.settings.create_new_character_version(content).await?
                }
                SettingsKind::World => app.settings.create_new_world_version(content).await?,
            };
            println!("{}", loaded.version);
        }
        SettingsCommand::Save {
            novel_id,
            kind,
            version,
            file,
        } => {
            let content = read_optional(Some(&file)).await?;
            app.settings.load_settings(&novel_id).await?;
            if let Some(version) = version {
                app.settings.load_version(kind, &version).await?;
            }
            match kind {
                SettingsKind::Character => app.settings.save_character_settings(content).await?,
                SettingsKind::World => app.settings.save_world_settings(content).await?,
            }
        }
    }
    Ok(())
}
