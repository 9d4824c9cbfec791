//! Registers an account, signs in, refreshes, and walks through a password reset against the
//! in-memory stores, printing every email instead of sending it.

// std
use std::sync::Arc;
// crates.io
use color_eyre::{Result, eyre::eyre};
use parking_lot::Mutex;
// self
use identity_gate::{
	AuthService,
	auth::Secret,
	config::AuthConfig,
	ext::{DispatchFuture, EmailDispatcher, EmailKind},
	flows::Registration,
	store::{MemoryCache, MemoryUserRepository},
	token::SigningKey,
};

#[derive(Debug, Default)]
struct StdoutMailer {
	last_reset: Mutex<Option<String>>,
}
impl StdoutMailer {
	fn print(&self, kind: EmailKind, email: &str, raw_token: &Secret) {
		println!("[mail:{kind}] to={email} token={}", raw_token.expose());

		if kind == EmailKind::ForgotPassword {
			*self.last_reset.lock() = Some(raw_token.expose().to_owned());
		}
	}
}
impl EmailDispatcher for StdoutMailer {
	fn send_confirmation_email<'a>(
		&'a self,
		email: &'a str,
		raw_token: &'a Secret,
	) -> DispatchFuture<'a> {
		Box::pin(async move {
			self.print(EmailKind::Confirmation, email, raw_token);

			Ok(())
		})
	}

	fn send_forgot_password_email<'a>(
		&'a self,
		email: &'a str,
		raw_token: &'a Secret,
	) -> DispatchFuture<'a> {
		Box::pin(async move {
			self.print(EmailKind::ForgotPassword, email, raw_token);

			Ok(())
		})
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = AuthConfig::from_json_str(r#"{"password_hash_cost":4}"#)?;
	let mailer = Arc::new(StdoutMailer::default());
	let service = AuthService::new(
		config,
		SigningKey::secret("quickstart-signing-secret"),
		Arc::new(MemoryUserRepository::default()),
		Arc::new(MemoryCache::default()),
		mailer.clone(),
	)?;
	let tokens = service.register(Registration::new("ada@example.com", "ada_l", "engine1")).await?;

	println!("registered; access token = {}", tokens.access.expose());

	let tokens = service.login("127.0.0.1", "ada_l", &Secret::new("engine1")).await?;
	let access = service.refresh_access_token(tokens.refresh.expose()).await?;

	println!("refreshed; access token = {}", access.expose());

	service.forgot_password("ada@example.com").await?;
	service.tasks.wait_idle().await;

	let reset = mailer.last_reset.lock().clone().ok_or_else(|| eyre!("no reset email was sent"))?;
	let new_password = Secret::new("engine2");

	service.password_reset(&reset, &new_password, &new_password).await?;
	service.login("127.0.0.1", "ada@example.com", &new_password).await?;

	println!("password reset and signed in again");

	service.shutdown().await;

	Ok(())
}
