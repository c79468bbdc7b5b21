use crate::Result;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

const MYSQL_PORT: u16 = 3306;

/// Image and credentials of a disposable MySQL server.
#[derive(Debug, Clone, TypedBuilder)]
pub struct MySqlSettings {
    #[builder(default = "8.4".to_string(), setter(into))]
    pub image_tag: String,
    #[builder(default = "keyhole".to_string(), setter(into))]
    pub database: String,
    #[builder(default = "keyhole".to_string(), setter(into))]
    pub username: String,
    #[builder(default = "keyhole".to_string(), setter(into))]
    pub password: String,
}

impl Default for MySqlSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Test fixture for a disposable MySQL server holding the durable store.
///
/// The container is removed when the fixture is dropped.
pub struct MySqlServer {
    container: ContainerAsync<GenericImage>,
    settings: MySqlSettings,
}

impl MySqlServer {
    /// Starts a server with [`MySqlSettings::default`].
    pub async fn start_default() -> Result<Self> {
        Self::start(MySqlSettings::default()).await
    }

    pub async fn start(settings: MySqlSettings) -> Result<Self> {
        let container = GenericImage::new("mysql", settings.image_tag.as_str())
            .with_exposed_port(MYSQL_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
            .with_env_var("MYSQL_DATABASE", settings.database.as_str())
            .with_env_var("MYSQL_USER", settings.username.as_str())
            .with_env_var("MYSQL_PASSWORD", settings.password.as_str())
            .with_env_var("MYSQL_ROOT_PASSWORD", settings.password.as_str())
            .start()
            .await?;

        Ok(Self {
            container,
            settings,
        })
    }

    /// Host and mapped port the server is reachable on.
    pub async fn endpoint(&self) -> Result<(String, u16)> {
        let host = self.container.get_host().await?.to_string();
        let port = self.container.get_host_port_ipv4(MYSQL_PORT).await?;
        Ok((host, port))
    }

    /// A `mysql://` DSN for the configured user and database.
    pub async fn dsn(&self) -> Result<String> {
        let (host, port) = self.endpoint().await?;
        let MySqlSettings {
            database,
            username,
            password,
            ..
        } = &self.settings;
        Ok(format!(
            "mysql://{username}:{password}@{host}:{port}/{database}"
        ))
    }}
