//! Transactional email (AWS SES v2, plain text, French)

use aws_sdk_sesv2::Client as SesClient;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone)]
pub struct EmailClient {
    ses: SesClient,
    from: String,
    base_url: String,
}

/// Subject and body of one message
#[derive(Debug)]
pub struct Letter {
    pub subject: String,
    pub body: String,
}

impl EmailClient {
    pub fn new(ses: SesClient, from: String, base_url: String) -> Self {
        Self {
            ses,
            from,
            base_url,
        }
    }

    fn login_url(&self) -> String {
        format!("{}/login", self.base_url.trim_end_matches('/'))
    }

    async fn send(&self, to: &str, letter: Letter) -> Result<(), BoxError> {
        let subject = Content::builder().data(letter.subject).build()?;
        let body = Body::builder()
            .text(Content::builder().data(letter.body).build()?)
            .build();
        let message = Message::builder().subject(subject).body(body).build();

        self.ses
            .send_email()
            .from_email_address(&self.from)
            .destination(Destination::builder().to_addresses(to).build())
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await?;
        Ok(())
    }

    pub async fn send_welcome_credentials(
        &self,
        to: &str,
        restaurant_name: &str,
        temp_password: &str,
    ) -> Result<(), BoxError> {
        let letter = welcome_letter(restaurant_name, to, temp_password, &self.login_url());
        self.send(to, letter).await?;
        tracing::info!(to = to, "Welcome credentials sent");
        Ok(())
    }

    pub async fn send_password_reset(&self, to: &str, temp_password: &str) -> Result<(), BoxError> {
        let letter = password_reset_letter(temp_password, &self.login_url());
        self.send(to, letter).await?;
        tracing::info!(to = to, "Password reset sent");
        Ok(())
    }
}

pub fn welcome_letter(
    restaurant_name: &str,
    login_email: &str,
    temp_password: &str,
    login_url: &str,
) -> Letter {
    Letter {
        subject: format!("Bienvenue : votre espace {restaurant_name} est prêt"),
        body: format!(
            "Bonjour,\n\n\
             Le compte de votre restaurant « {restaurant_name} » a été créé.\n\n\
             Identifiant : {login_email}\n\
             Mot de passe temporaire : {temp_password}\n\n\
             Connectez-vous sur {login_url}\n\
             Vous devrez choisir un nouveau mot de passe lors de votre première connexion.\n"
        ),
    }
}

pub fn password_reset_letter(temp_password: &str, login_url: &str) -> Letter {
    Letter {
        subject: "Réinitialisation de votre mot de passe".to_string(),
        body: format!(
            "Bonjour,\n\n\
             Votre mot de passe a été réinitialisé par un administrateur.\n\n\
             Mot de passe temporaire : {temp_password}\n\n\
             Connectez-vous sur {login_url}\n\
             Vous devrez choisir un nouveau mot de passe lors de votre prochaine connexion.\n"
        ),
    }
}
