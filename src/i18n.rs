use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header::{AcceptLanguage, Header, Preference, Quality};
use actix_web::{web, FromRequest, HttpRequest};

/// The locales the application is willing to serve, in order of preference.
/// The first entry is the fallback when negotiation finds no match.
#[derive(Debug, Clone)]
pub struct Languages(Vec<String>);

impl Languages {
    pub fn new(languages: Vec<String>) -> Self {
        Self(languages)
    }

    pub fn default_language(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or("en")
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// The locale negotiated for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(String);

impl Locale {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Negotiates the locale from the request's `Accept-Language` header.
    ///
    /// A missing or malformed header counts as no preference at all.
    pub fn negotiate(request: &HttpRequest, languages: &Languages) -> Self {
        let accept_language =
            AcceptLanguage::parse(request).unwrap_or_else(|_| AcceptLanguage(vec![]));
        let code = best_match(&accept_language, languages.as_slice())
            .unwrap_or_else(|| languages.default_language().to_string());
        Self(code)
    }

    /// The locale for `request`, negotiated against the registered [`Languages`].
    pub fn of(request: &HttpRequest) -> Self {
        match request.app_data::<web::Data<Languages>>() {
            Some(languages) => Locale::negotiate(request, languages),
            None => Locale::default(),
        }
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn t(&self, message: Message) -> &'static str {
        message.translate(&self.0)
    }

    pub fn greeting(&self, username: &str) -> String {
        match self.0.as_str() {
            "es" => format!("¡Hola, {}!", username),
            _ => format!("Hi, {}!", username),
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self("en".into())
    }
}

impl FromRequest for Locale {
    type Error = actix_web::Error;
    type Future = Ready<Result<Locale, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Locale::of(req)))
    }
}

/// A client language range, `None` standing for `*`, with its weight.
type Weighted = (Option<String>, Quality);

/// Picks the supported language that best satisfies an `Accept-Language` header.
///
/// The highest quality wins. Between equal qualities an explicit tag beats `*`, and after that
/// the order of `supported` decides, not the order of the header. Tags are compared
/// case-insensitively with `_` read as `-`. When nothing matches exactly, regional variants are
/// reduced to their primary subtag, first on the client side (`es-MX` selects `es`) and then
/// on ours (`es` selects `es-MX`).
pub fn best_match(accept_language: &AcceptLanguage, supported: &[String]) -> Option<String> {
    let preferences: Vec<Weighted> = accept_language
        .0
        .iter()
        .filter(|item| item.quality > Quality::ZERO)
        .map(|item| {
            let range = match &item.item {
                Preference::Any => None,
                Preference::Specific(tag) => Some(normalize(tag.as_str())),
            };
            (range, item.quality)
        })
        .collect();
    let candidates: Vec<String> = supported.iter().map(|language| normalize(language)).collect();

    let index = best_index(&preferences, &candidates)
        .or_else(|| {
            let client_primaries: Vec<Weighted> = preferences
                .iter()
                .map(|(range, quality)| {
                    let primary = range.as_deref().map(|tag| primary_subtag(tag).to_string());
                    (primary, *quality)
                })
                .collect();
            best_index(&client_primaries, &candidates)
        })
        .or_else(|| {
            let our_primaries: Vec<String> = candidates
                .iter()
                .map(|tag| primary_subtag(tag).to_string())
                .collect();
            best_index(&preferences, &our_primaries)
        })?;
    Some(supported[index].clone())
}

/// The index of the candidate with the best matching preference.
///
/// Candidates are visited in order and a later one only takes over on a strictly better match,
/// so earlier candidates win ties.
fn best_index(preferences: &[Weighted], candidates: &[String]) -> Option<usize> {
    let mut best: Option<(usize, Quality, bool)> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        for (range, quality) in preferences {
            let specific = range.is_some();
            let better = match best {
                None => true,
                Some((_, best_quality, best_specific)) => {
                    *quality > best_quality
                        || (*quality == best_quality && specific && !best_specific)
                }
            };
            let matches = range.as_deref().map_or(true, |tag| tag == candidate);
            if better && matches {
                best = Some((index, *quality, specific));
            }
        }
    }
    best.map(|(index, _, _)| index)
}

fn normalize(tag: &str) -> String {
    tag.trim().to_lowercase().replace('_', "-")
}

fn primary_subtag(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

/// Every user-facing string in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    // field labels and buttons
    Username,
    Email,
    Password,
    RepeatPassword,
    RememberMe,
    SignIn,
    Register,
    RequestPasswordReset,
    ResetPassword,
    SaySomething,
    Submit,
    // validation
    FieldRequired,
    InvalidEmail,
    PasswordsMustMatch,
    UsernameTooLong,
    PostLength,
    UsernameTaken,
    EmailTaken,
    // flash messages
    InvalidCredentials,
    LoginRequired,
    RegistrationComplete,
    CheckYourEmail,
    PasswordHasBeenReset,
    PostIsLive,
    // navigation and pages
    Home,
    Login,
    Logout,
    Profile,
    User,
    NewUser,
    ClickToRegister,
    ForgotPassword,
    ClickToReset,
    NewerPosts,
    OlderPosts,
    Back,
    NotFound,
    UnexpectedError,
    AdministratorNotified,
}

impl Message {
    pub fn translate(self, locale: &str) -> &'static str {
        match locale {
            "es" => self.spanish(),
            _ => self.english(),
        }
    }

    fn english(self) -> &'static str {
        match self {
            Message::Username => "Username",
            Message::Email => "Email",
            Message::Password => "Password",
            Message::RepeatPassword => "Repeat Password",
            Message::RememberMe => "Remember Me",
            Message::SignIn => "Sign In",
            Message::Register => "Register",
            Message::RequestPasswordReset => "Request Password Reset",
            Message::ResetPassword => "Reset Your Password",
            Message::SaySomething => "Say something",
            Message::Submit => "Submit",
            Message::FieldRequired => "This field is required.",
            Message::InvalidEmail => "Invalid email address.",
            Message::PasswordsMustMatch => "Field must be equal to password.",
            Message::UsernameTooLong => "Field cannot be longer than 64 characters.",
            Message::PostLength => "Field must be between 1 and 140 characters long.",
            Message::UsernameTaken => "Please use a different username.",
            Message::EmailTaken => "Please use a different email address.",
            Message::InvalidCredentials => "Invalid username or password",
            Message::LoginRequired => "Please log in to access this page.",
            Message::RegistrationComplete => "Congratulations, you are now a registered user!",
            Message::CheckYourEmail => {
                "Check your email for the instructions to reset your password"
            }
            Message::PasswordHasBeenReset => "Your password has been reset.",
            Message::PostIsLive => "Your post is now live!",
            Message::Home => "Home",
            Message::Login => "Login",
            Message::Logout => "Logout",
            Message::Profile => "Profile",
            Message::User => "User",
            Message::NewUser => "New User?",
            Message::ClickToRegister => "Click to Register!",
            Message::ForgotPassword => "Forgot Your Password?",
            Message::ClickToReset => "Click to Reset It",
            Message::NewerPosts => "Newer posts",
            Message::OlderPosts => "Older posts",
            Message::Back => "Back",
            Message::NotFound => "File Not Found",
            Message::UnexpectedError => "An unexpected error has occurred",
            Message::AdministratorNotified => {
                "The administrator has been notified. Sorry for the inconvenience!"
            }
        }
    }

    fn spanish(self) -> &'static str {
        match self {
            Message::Username => "Nombre de usuario",
            Message::Email => "Email",
            Message::Password => "Contraseña",
            Message::RepeatPassword => "Repetir Contraseña",
            Message::RememberMe => "Recordarme",
            Message::SignIn => "Ingresar",
            Message::Register => "Registrarse",
            Message::RequestPasswordReset => "Pedir una nueva contraseña",
            Message::ResetPassword => "Nueva Contraseña",
            Message::SaySomething => "Dí algo",
            Message::Submit => "Enviar",
            Message::FieldRequired => "Este campo es obligatorio.",
            Message::InvalidEmail => "Dirección de email inválida.",
            Message::PasswordsMustMatch => "El campo debe ser igual a la contraseña.",
            Message::UsernameTooLong => "El campo no puede tener más de 64 caracteres.",
            Message::PostLength => "El campo debe tener entre 1 y 140 caracteres.",
            Message::UsernameTaken => "Por favor use un nombre de usuario diferente.",
            Message::EmailTaken => "Por favor use una dirección de email diferente.",
            Message::InvalidCredentials => "Nombre de usuario o contraseña inválidos",
            Message::LoginRequired => "Por favor ingrese para acceder a esta página.",
            Message::RegistrationComplete => "¡Felicitaciones, ya eres un usuario registrado!",
            Message::CheckYourEmail => {
                "Busca en tu email las instrucciones para crear una nueva contraseña"
            }
            Message::PasswordHasBeenReset => "Tu contraseña ha sido cambiada.",
            Message::PostIsLive => "¡Tu artículo ha sido publicado!",
            Message::Home => "Inicio",
            Message::Login => "Ingresar",
            Message::Logout => "Salir",
            Message::Profile => "Perfil",
            Message::User => "Usuario",
            Message::NewUser => "¿Usuario Nuevo?",
            Message::ClickToRegister => "¡Haz click aquí para registrarte!",
            Message::ForgotPassword => "¿Te olvidaste tu contraseña?",
            Message::ClickToReset => "Haz click aquí para pedir una nueva",
            Message::NewerPosts => "Artículos siguientes",
            Message::OlderPosts => "Artículos previos",
            Message::Back => "Atrás",
            Message::NotFound => "Página No Encontrada",
            Message::UnexpectedError => "Ha ocurrido un error inesperado",
            Message::AdministratorNotified => {
                "El administrador ha sido notificado. ¡Lamentamos la inconveniencia!"
            }
        }
    }
}
