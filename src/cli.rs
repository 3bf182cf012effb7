use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "coffee-ai")]
#[command(about = "コーヒー豆ラベルAI解析 HTTPリレー", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 設定ファイル（デフォルト: ~/.config/coffee-ai/config.json）
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// HTTPサーバーを起動
    Serve {
        /// 待ち受けポート
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Claude APIキー
        #[arg(long, env = "CLAUDE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// ローカルの画像ファイルを1枚解析してJSONを出力
    Analyze {
        /// 画像ファイルのパス
        #[arg(required = true)]
        image: PathBuf,

        /// MIMEタイプのヒント（省略時は拡張子から推定）
        #[arg(short, long)]
        mime_type: Option<String>,

        /// 出力JSONファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Claude APIキー
        #[arg(long, env = "CLAUDE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// 拡張子からMIMEタイプのヒントを作る
pub fn mime_hint_from_path(path: &std::path::Path) -> String {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg".into(),
        "" => String::new(),
        other => format!("image/{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::Path;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from(["coffee-ai", "analyze", "bag.png", "-m", "image/png"]).unwrap();
        match cli.command {
            Commands::Analyze { image, mime_type, .. } => {
                assert_eq!(image, PathBuf::from("bag.png"));
                assert_eq!(mime_type.as_deref(), Some("image/png"));
            }
            _ => panic!("Expected Analyze"),
        }
    }

    #[test]
    fn test_mime_hint_from_path() {
        assert_eq!(mime_hint_from_path(Path::new("bag.JPG")), "image/jpeg");
        assert_eq!(mime_hint_from_path(Path::new("bag.webp")), "image/webp");
        assert_eq!(mime_hint_from_path(Path::new("bag")), "");
    }
}
