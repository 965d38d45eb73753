use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rust_press::core::{Server, Site};
use rust_press::models::{ContentType, ListFilter, SortOrder};
use rust_press::theme::{ThemeRenderer, MANIFEST_FILE};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 指定站点目录
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 初始化新的站点
    Init(InitArgs),

    /// 启动本地服务器
    Serve(ServeArgs),

    /// 解析一个路径并输出数据契约
    Resolve(ResolveArgs),

    /// 检查配置、内容和主题清单
    Check,
}

#[derive(Args)]
pub struct InitArgs {
    /// 站点目录名称
    #[arg(value_name = "NAME")]
    pub name: String,

    /// 站点标题
    #[arg(short, long)]
    pub title: Option<String>,
}

#[derive(Args)]
pub struct ServeArgs {
    /// 服务器端口
    #[arg(short, long, default_value = "4000")]
    pub port: u16,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// 请求路径，例如 `/hello-world` 或 `/category/rust`
    #[arg(default_value = "/")]
    pub path: String,

    /// 页码，小于 1 时按 1 处理
    #[arg(long, default_value = "1", allow_hyphen_values = true)]
    pub page: i64,
}

// 嵌入的默认配置模板
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# 站点信息
title: {title}
subtitle: '又一个 rust-press 站点'
description: ''
author: ''
language: zh-CN

# URL配置
url: http://localhost:4000
root: /

# 站点图标
logo:
favicon:

# 分页配置
per_page: 10

# 主题配置
theme: default

# 首页：posts 显示文章列表，page 显示 page_id 指定的页面
homepage:
  mode: posts
  page_id:

# 插件配置
plugins:
  - word-count
  - search
"#;

// 嵌入的默认主题文件
mod default_theme {
    pub const MANIFEST_YML: &str = include_str!("../../embed/theme/default/manifest.yml");
    pub const STYLE_CSS: &str = include_str!("../../embed/theme/default/source/css/style.css");

    pub const LAYOUTS: &[(&str, &str)] = &[
        ("base.html", include_str!("../../embed/theme/default/layout/base.html")),
        ("post.html", include_str!("../../embed/theme/default/layout/post.html")),
        ("page.html", include_str!("../../embed/theme/default/layout/page.html")),
        ("archive.html", include_str!("../../embed/theme/default/layout/archive.html")),
        ("search.html", include_str!("../../embed/theme/default/layout/search.html")),
        ("404.html", include_str!("../../embed/theme/default/layout/404.html")),
    ];
}

const HELLO_POST: &str = r#"---
title: Hello World
date: 2024-01-01 12:00:00
categories:
  - 入门指南
tags:
  - rust-press
---

这是站点的第一篇文章。

<!-- more -->

编辑 `source/_posts/hello-world.md` 开始写作，然后运行 `rust-press serve`。
"#;

const ABOUT_PAGE: &str = r#"---
title: About
date: 2024-01-01 12:00:00
---

关于这个站点。
"#;

// 初始化网站文件结构，包括创建默认主题和示例文件
fn initialize_site_structure(site_path: &Path, site_title: &str) -> Result<()> {
    let source_dir = site_path.join("source");
    let posts_dir = source_dir.join("_posts");
    let data_dir = source_dir.join("_data");
    let theme_dir = site_path.join("themes").join("default");
    let theme_layout_dir = theme_dir.join("layout");
    let theme_css_dir = theme_dir.join("source").join("css");

    for dir in &[&posts_dir, &data_dir, &theme_layout_dir, &theme_css_dir] {
        fs::create_dir_all(dir).with_context(|| format!("无法创建目录 {}", dir.display()))?;
    }

    fs::write(site_path.join("_config.yml"), DEFAULT_CONFIG_TEMPLATE.replace("{title}", site_title))?;

    fs::write(theme_dir.join(MANIFEST_FILE), default_theme::MANIFEST_YML)?;
    fs::write(theme_css_dir.join("style.css"), default_theme::STYLE_CSS)?;
    for (name, content) in default_theme::LAYOUTS {
        fs::write(theme_layout_dir.join(name), content)?;
    }

    fs::write(posts_dir.join("hello-world.md"), HELLO_POST)?;
    fs::write(source_dir.join("about.md"), ABOUT_PAGE)?;
    fs::write(data_dir.join("authors.yml"), "[]\n")?;
    fs::write(data_dir.join("media.yml"), "[]\n")?;

    Ok(())
}

/// 执行命令
pub async fn execute(cli: Cli) -> Result<()> {
    let site_path = cli.path.clone();

    match cli.command {
        Commands::Init(args) => {
            let site_path = site_path.join(&args.name);

            // 如果目录不为空，询问用户是否继续
            if site_path.exists() && site_path.read_dir()?.next().is_some() {
                println!("Directory is not empty. Do you want to continue? (y/N)");
                let mut input = String::new();
                std::io::stdin().read_line(&mut input)?;
                if !input.trim().eq_ignore_ascii_case("y") {
                    println!("Operation cancelled.");
                    return Ok(());
                }
            }

            fs::create_dir_all(&site_path)?;
            let site_title = args.title.unwrap_or_else(|| args.name.clone());
            initialize_site_structure(&site_path, &site_title)?;

            info!("Initialized new site at: {}", site_path.display());
        }
        Commands::Serve(args) => {
            let site = Site::open(&site_path)?;
            let theme = site.settings().theme;
            let renderer = ThemeRenderer::new(&site_path, &theme)?;
            Server::new(site, renderer, args.port).start().await?;
        }
        Commands::Resolve(args) => {
            let site = Site::open(&site_path)?;
            let page = args.page.max(1) as usize;
            let contract = site.resolve_page(&args.path, page)?;

            println!("{} {}", "template:".bright_cyan(), contract.template.bright_white());
            for fault in &contract.faults {
                println!("{} {}: {}", "fault:".bright_red(), fault.provider, fault.message);
            }
            println!("{}", serde_json::to_string_pretty(&contract)?);
        }
        Commands::Check => {
            let site = Site::open(&site_path)?;
            let settings = site.settings();

            println!("{} {}", "站点:".bright_cyan(), settings.site_title);
            println!("{} {}", "URL:".bright_cyan(), settings.url);
            let lookup = site.lookup();
            let (_, posts) = lookup.list_live(&ListFilter::posts(), SortOrder::Newest, 1, 1);
            let pages_filter = ListFilter {
                kind: ContentType::Page,
                ..ListFilter::posts()
            };
            let (_, pages) = lookup.list_live(&pages_filter, SortOrder::Newest, 1, 1);
            println!("{} {} 篇文章, {} 个页面", "内容:".bright_cyan(), posts, pages);

            let manifest = site.manifests().load(&settings.theme)?;
            println!("{} {} ({})", "主题:".bright_cyan(), manifest.name, settings.theme);

            let dispatcher = site.begin_request()?;
            let routes: Vec<&str> = dispatcher.tables().routes.segments().collect();
            println!("{} {}", "插件:".bright_cyan(), site.plugins().names().join(", "));
            println!("{} {}", "插件路由:".bright_cyan(), routes.join(", "));
            println!("{}", "OK".bright_green());
        }
    }

    Ok(())
}
