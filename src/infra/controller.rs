use async_trait::async_trait;
use salvo::{
    http::{form::FormData, StatusCode},
    writer::Json,
    Depot, FlowCtrl, Handler, Request, Response,
};

use crate::{
    app::{
        resource::{CreateUserForm, PatchUserForm, ReplaceUserForm, UserMutated},
        use_case,
    },
    domain::{datatype::image::ImageError, entity::DEFAULT_ROLE},
    error::{http::BadRequest, merge::MergeError},
};

use super::database::repository::{PgCityResolver, PgUserStore};

macro_rules! map_res_err {
    ($result:expr, $response:ident) => {
        match $result {
            Err(err) => {
                $response.render(err);
                return;
            }
            Ok(ok) => ok,
        }
    };
}

/// The `<id:num>` wisp admits digit runs longer than an i32; an id that
/// cannot exist is reported as not found instead of panicking.
fn parse_id(raw: &str) -> Result<i32, MergeError> {
    raw.parse().map_err(|_| MergeError::NotFound)
}

fn extract_id(req: &Request) -> Result<i32, MergeError> {
    let raw = req.params().get("id").ok_or(MergeError::NotFound)?;
    parse_id(raw)
}

/// The `dto` query flag selects the reduced public projection and defaults
/// to true; only an explicit `dto=false` (any casing) yields the full record.
fn dto_flag(value: Option<&String>) -> bool {
    value.map_or(true, |value| !value.eq_ignore_ascii_case("false"))
}

fn extract_dto_flag(req: &Request) -> bool {
    dto_flag(req.queries().get("dto"))
}

/// A field is missing only when absent from the form; a supplied empty
/// string is a value and passes through.
fn require_field(value: Option<&String>, name: &str) -> Result<String, BadRequest> {
    value
        .cloned()
        .ok_or_else(|| BadRequest::MissingField(name.into()))
}

/// Account fields of the create payload must be supplied non-empty.
fn require_text(value: Option<&String>, name: &str) -> Result<String, BadRequest> {
    match value {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(BadRequest::MissingField(name.into())),
    }
}

fn require_int(value: Option<&String>, name: &str) -> Result<i32, BadRequest> {
    match value {
        Some(value) if value.is_empty() => Err(BadRequest::MissingField(name.into())),
        Some(value) => value
            .parse()
            .map_err(|_| BadRequest::MalformedField(name.into())),
        None => Err(BadRequest::MissingField(name.into())),
    }
}

/// Numeric fields follow the original form binding: an empty value reads as
/// absent, a non-numeric one is malformed.
fn optional_int(value: Option<&String>, name: &str) -> Result<Option<i32>, BadRequest> {
    match value {
        Some(value) if value.is_empty() => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| BadRequest::MalformedField(name.into())),
        None => Ok(None),
    }
}

/// Reads the bytes of an uploaded profile image, when one came in. Empty
/// uploads are passed through and dealt with by the merge policy.
async fn read_upload(form: &FormData) -> Result<Option<Vec<u8>>, MergeError> {
    match form.files.get("image") {
        Some(file) => {
            let bytes = tokio::fs::read(file.path())
                .await
                .map_err(|err| MergeError::ImageProcessing(ImageError::UnreadableUpload(err)))?;
            Ok(Some(bytes))
        }
        None => Ok(None),
    }
}

pub struct CreateUserController {
    store: PgUserStore,
    cities: PgCityResolver,
}

impl CreateUserController {
    pub fn new(store: PgUserStore, cities: PgCityResolver) -> Self {
        Self { store, cities }
    }
}

#[async_trait]
impl Handler for CreateUserController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let form = map_res_err!(req.form_data().await.map_err(BadRequest::from), res);

        let username = map_res_err!(require_text(form.fields.get("username"), "username"), res);
        let password = map_res_err!(require_text(form.fields.get("password"), "password"), res);
        let email = map_res_err!(require_text(form.fields.get("email"), "email"), res);
        // only an absent role falls back; a supplied value, empty included,
        // must parse as a role member
        let role = form
            .fields
            .get("role")
            .cloned()
            .unwrap_or_else(|| DEFAULT_ROLE.as_str().to_owned());
        let city_id = map_res_err!(optional_int(form.fields.get("cityId"), "cityId"), res);
        let postal_code =
            map_res_err!(optional_int(form.fields.get("postalCode"), "postalCode"), res);
        let image = map_res_err!(read_upload(form).await, res);

        let payload = CreateUserForm {
            username,
            password: password.into(),
            email,
            role,
            phone_number: form.fields.get("phoneNumber").cloned(),
            address: form.fields.get("address").cloned(),
            city_id,
            postal_code,
            image,
        };

        let result = use_case::users::create_user(&self.store, &self.cities, payload).await;
        let user_id = map_res_err!(result, res);

        res.render(Json(UserMutated { user_id }));
        res.set_status_code(StatusCode::CREATED);
    }
}

pub struct ReplaceUserController {
    store: PgUserStore,
    cities: PgCityResolver,
}

impl ReplaceUserController {
    pub fn new(store: PgUserStore, cities: PgCityResolver) -> Self {
        Self { store, cities }
    }
}

#[async_trait]
impl Handler for ReplaceUserController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let id = map_res_err!(extract_id(req), res);
        let form = map_res_err!(req.form_data().await.map_err(BadRequest::from), res);

        let username = map_res_err!(require_field(form.fields.get("username"), "username"), res);
        let password = map_res_err!(require_field(form.fields.get("password"), "password"), res);
        let email = map_res_err!(require_field(form.fields.get("email"), "email"), res);
        let role = map_res_err!(require_field(form.fields.get("role"), "role"), res);
        let phone_number =
            map_res_err!(require_field(form.fields.get("phoneNumber"), "phoneNumber"), res);
        let address = map_res_err!(require_field(form.fields.get("address"), "address"), res);
        let city_id = map_res_err!(require_int(form.fields.get("cityId"), "cityId"), res);
        let postal_code =
            map_res_err!(require_int(form.fields.get("postalCode"), "postalCode"), res);
        let image = map_res_err!(read_upload(form).await, res);

        let payload = ReplaceUserForm {
            username,
            password: password.into(),
            email,
            role,
            phone_number,
            address,
            city_id,
            postal_code,
            image,
        };

        let result = use_case::users::replace_user(&self.store, &self.cities, id, payload).await;
        let user_id = map_res_err!(result, res);

        res.render(Json(UserMutated { user_id }));
        res.set_status_code(StatusCode::OK);
    }
}

pub struct PatchUserController {
    store: PgUserStore,
    cities: PgCityResolver,
}

impl PatchUserController {
    pub fn new(store: PgUserStore, cities: PgCityResolver) -> Self {
        Self { store, cities }
    }
}

#[async_trait]
impl Handler for PatchUserController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let id = map_res_err!(extract_id(req), res);
        let form = map_res_err!(req.form_data().await.map_err(BadRequest::from), res);

        let city_id = map_res_err!(optional_int(form.fields.get("cityId"), "cityId"), res);
        let postal_code =
            map_res_err!(optional_int(form.fields.get("postalCode"), "postalCode"), res);
        let image = map_res_err!(read_upload(form).await, res);

        // supplied-empty text fields blank the column; only absence leaves it
        let payload = PatchUserForm {
            username: form.fields.get("username").cloned(),
            password: form.fields.get("password").cloned().map(Into::into),
            email: form.fields.get("email").cloned(),
            role: form.fields.get("role").cloned(),
            phone_number: form.fields.get("phoneNumber").cloned(),
            address: form.fields.get("address").cloned(),
            city_id,
            postal_code,
            image,
        };

        let result = use_case::users::patch_user(&self.store, &self.cities, id, payload).await;
        let user_id = map_res_err!(result, res);

        res.render(Json(UserMutated { user_id }));
        res.set_status_code(StatusCode::OK);
    }
}

pub struct DeleteUserController {
    store: PgUserStore,
}

impl DeleteUserController {
    pub fn new(store: PgUserStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler for DeleteUserController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let id = map_res_err!(extract_id(req), res);

        let result = use_case::users::delete_user(&self.store, id).await;
        map_res_err!(result, res);

        res.set_status_code(StatusCode::NO_CONTENT);
    }
}

pub struct GetUserByIdController {
    store: PgUserStore,
}

impl GetUserByIdController {
    pub fn new(store: PgUserStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler for GetUserByIdController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let id = map_res_err!(extract_id(req), res);
        let as_dto = extract_dto_flag(req);

        let result = use_case::users::find_user_by_id(&self.store, id, as_dto).await;
        match map_res_err!(result, res) {
            Some(view) => res.render(Json(view)),
            None => res.render(MergeError::NotFound),
        }
    }
}

pub struct GetUserByUsernameController {
    store: PgUserStore,
}

impl GetUserByUsernameController {
    pub fn new(store: PgUserStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler for GetUserByUsernameController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let username = match req.params().get("username") {
            Some(username) => username.clone(),
            None => {
                res.render(BadRequest::MissingField("username".into()));
                return;
            }
        };
        let as_dto = extract_dto_flag(req);

        let result = use_case::users::find_user_by_username(&self.store, &username, as_dto).await;
        match map_res_err!(result, res) {
            Some(view) => res.render(Json(view)),
            None => res.render(MergeError::NotFound),
        }
    }
}

pub struct GetUserByEmailController {
    store: PgUserStore,
}

impl GetUserByEmailController {
    pub fn new(store: PgUserStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler for GetUserByEmailController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let email = match req.params().get("email") {
            Some(email) => email.clone(),
            None => {
                res.render(BadRequest::MissingField("email".into()));
                return;
            }
        };
        let as_dto = extract_dto_flag(req);

        let result = use_case::users::find_user_by_email(&self.store, &email, as_dto).await;
        match map_res_err!(result, res) {
            Some(view) => res.render(Json(view)),
            None => res.render(MergeError::NotFound),
        }
    }
}

pub struct ListUsersController {
    store: PgUserStore,
}

impl ListUsersController {
    pub fn new(store: PgUserStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler for ListUsersController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let as_dto = extract_dto_flag(req);

        let result = use_case::users::list_users(&self.store, as_dto).await;
        let views = map_res_err!(result, res);

        // an empty platform lists as an empty collection, not as a 404
        res.render(Json(views));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn id_param_overflowing_i32_reads_as_not_found() {
        assert!(matches!(
            parse_id("99999999999999999999"),
            Err(MergeError::NotFound)
        ));
        assert_eq!(parse_id("42").unwrap(), 42);
    }

    #[test]
    fn supplied_empty_field_is_a_value_not_an_absence() {
        let empty = String::new();
        assert_eq!(require_field(Some(&empty), "phoneNumber").unwrap(), "");
        let address = String::from("Calle Mayor 1");
        assert_eq!(
            require_field(Some(&address), "address").unwrap(),
            "Calle Mayor 1"
        );
        assert!(matches!(
            require_field(None, "address"),
            Err(BadRequest::MissingField(_))
        ));
    }

    #[test]
    fn account_fields_reject_a_supplied_empty_value() {
        let empty = String::new();
        assert!(matches!(
            require_text(Some(&empty), "username"),
            Err(BadRequest::MissingField(_))
        ));
        assert!(matches!(
            require_text(None, "username"),
            Err(BadRequest::MissingField(_))
        ));
        let username = String::from("ana");
        assert_eq!(require_text(Some(&username), "username").unwrap(), "ana");
    }

    #[test]
    fn numeric_fields_read_empty_as_absent_and_junk_as_malformed() {
        let empty = String::new();
        assert_eq!(optional_int(Some(&empty), "cityId").unwrap(), None);
        let city = String::from("28");
        assert_eq!(optional_int(Some(&city), "cityId").unwrap(), Some(28));
        let junk = String::from("abc");
        assert!(matches!(
            optional_int(Some(&junk), "cityId"),
            Err(BadRequest::MalformedField(_))
        ));
        assert!(matches!(
            require_int(Some(&empty), "postalCode"),
            Err(BadRequest::MissingField(_))
        ));
        assert!(matches!(
            require_int(Some(&junk), "postalCode"),
            Err(BadRequest::MalformedField(_))
        ));
    }

    #[test]
    fn dto_flag_defaults_to_true_and_reads_false_case_insensitively() {
        assert!(dto_flag(None));
        assert!(dto_flag(Some(&String::from("true"))));
        assert!(!dto_flag(Some(&String::from("false"))));
        assert!(!dto_flag(Some(&String::from("False"))));
        assert!(!dto_flag(Some(&String::from("FALSE"))));
    }
}
