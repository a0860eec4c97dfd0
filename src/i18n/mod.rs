//! 多语言错误消息模块
//!
//! 使用rat_embed_lang框架提供统一的错误消息多语言支持

use rat_embed_lang::register_translations;
use std::collections::HashMap;

/// 错误消息翻译注册器
pub struct ErrorMessageI18n;

impl ErrorMessageI18n {
    /// 注册所有错误消息翻译
    pub fn register_all_translations() {
        let entries: &[(&str, &str, &str, &str)] = &[
            (
                "error.connection",
                "数据库连接失败: {message}",
                "Database connection failed: {message}",
                "データベース接続に失敗しました: {message}",
            ),
            (
                "error.reconnect",
                "无法重新连接数据库: {message}",
                "Unable to reconnect to database: {message}",
                "データベースに再接続できません: {message}",
            ),
            (
                "error.connection_unavailable",
                "连接不可用，等待重建",
                "Connection unavailable, awaiting reconnect",
                "接続が利用できません。再接続待ちです",
            ),
            (
                "error.task_panicked",
                "任务执行异常中止: {message}",
                "Task execution panicked: {message}",
                "タスクの実行中にパニックが発生しました: {message}",
            ),
            (
                "error.charset",
                "设置字符集失败: {message}",
                "Failed to set character set: {message}",
                "文字セットの設定に失敗しました: {message}",
            ),
            (
                "error.charset_invalid",
                "非法的字符集名称: {name}",
                "Invalid character set name: {name}",
                "無効な文字セット名: {name}",
            ),
            (
                "error.config",
                "配置错误: {message}",
                "Configuration error: {message}",
                "設定エラー: {message}",
            ),
            (
                "error.alias_not_found",
                "数据库别名 '{alias}' 未找到",
                "Database alias '{alias}' not found",
                "データベースエイリアス '{alias}' が見つかりません",
            ),
            (
                "error.not_running",
                "数据库 '{alias}' 已停止接收任务",
                "Database '{alias}' is no longer accepting work",
                "データベース '{alias}' はタスクを受け付けていません",
            ),
            (
                "error.worker_spawn",
                "工作线程启动失败: {message}",
                "Failed to start worker thread: {message}",
                "ワーカースレッドの起動に失敗しました: {message}",
            ),
            (
                "error.runtime",
                "创建tokio runtime失败: {message}",
                "Failed to create tokio runtime: {message}",
                "tokioランタイムの作成に失敗しました: {message}",
            ),
            (
                "error.unsupported_database",
                "不支持的数据库类型（可能需要启用相应的feature）: {db_type}",
                "Unsupported database type (a feature may need to be enabled): {db_type}",
                "サポートされていないデータベースタイプ（featureの有効化が必要な場合があります）: {db_type}",
            ),
            (
                "error.sqlite_file_not_found",
                "SQLite数据库文件不存在且未启用自动创建: {path}",
                "SQLite database file does not exist and auto-create is not enabled: {path}",
                "SQLiteデータベースファイルが存在せず、自動作成が有効ではありません: {path}",
            ),
        ];

        let mut translations = HashMap::new();
        for (key, zh, en, ja) in entries {
            let mut messages = HashMap::new();
            messages.insert("zh-CN".to_string(), zh.to_string());
            messages.insert("en-US".to_string(), en.to_string());
            messages.insert("ja-JP".to_string(), ja.to_string());
            translations.insert(key.to_string(), messages);
        }

        // 注册所有翻译
        register_translations(translations);
    }

    /// 初始化错误消息多语言支持
    pub fn init() {
        Self::register_all_translations();

        // 从环境变量获取语言设置，默认为zh-CN
        let lang = std::env::var("RAT_LANG")
            .or_else(|_| std::env::var("LANG"))
            .unwrap_or_else(|_| "zh-CN".to_string());

        // 标准化语言代码
        use rat_embed_lang::normalize_language_code;
        let normalized_lang = normalize_language_code(&lang);
        set_language(&normalized_lang);
    }
}

/// 重新导出rat_embed_lang的核心函数
pub use rat_embed_lang::{current_language, set_language, t, tf};
