mod settings;

pub use settings::{
    DatabaseConfig, EmailConfig, MailgunConfig, OtelConfig, ProviderKind, SendGridConfig,
    ServerConfig, Settings, TemplateBackend, TemplatesConfig,
};
