use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use pypitoken::{
    Context, ContextField, DateRestriction, Error, Format, LegacyDateRestriction,
    LegacyNoopRestriction, LoadError, ProjectIdsRestriction, ProjectNamesRestriction, Restriction,
    RestrictionParameters, Token, TokenOptions, UserIdRestriction, ValidationError, VerifyError,
};
use testresult::TestResult;

const PROJECT_ID: &str = "4c43d5f8-6ef7-4e49-a4d7-32e3eb51d4b0";
const USER_ID: &str = "d1e1fa2d-3a7b-4b43-8a4b-2a2cbe2f5a10";

fn token() -> Token {
    Token::create("example.com", "123foo", "ohsosecret")
}

#[test]
fn it_dumps_a_fresh_token() {
    let options = TokenOptions {
        prefix: "pre".into(),
        ..TokenOptions::default()
    };
    let token = Token::create_with("example.com", "123foo", "ohsosecret", &options).unwrap();
    assert_eq!(
        token.dump(),
        "pre-AgELZXhhbXBsZS5jb20CBjEyM2ZvbwAABiCK4TytWvy17_Up7TvhdVDhFx8cjU_ne_6wtOqxPUZmxw"
    );
}

#[test]
fn it_exposes_token_metadata() -> TestResult {
    let token = Token::load(
        "pre-AgELZXhhbXBsZS5jb20CBjEyM2ZvbwAABiCK4TytWvy17_Up7TvhdVDhFx8cjU_ne_6wtOqxPUZmxw",
    )?;
    assert_eq!(token.prefix(), "pre");
    assert_eq!(token.domain(), Some("example.com"));
    assert_eq!(token.identifier()?, "123foo");
    assert!(token.restrictions()?.is_empty());
    Ok(())
}

#[test]
fn it_requires_a_prefix() {
    let error = Token::load("foobar").unwrap_err();
    assert!(matches!(error, LoadError::MissingPrefix));
    assert_eq!(error.to_string(), "Token is missing a prefix");
}

#[test]
fn it_reports_undecodable_macaroons() {
    let error = Token::load("foobar-baz").unwrap_err();
    assert_eq!(
        error.to_string(),
        "Deserialization error: cannot determine data format of binary-encoded macaroon"
    );

    let error = Token::load("pypi-AgEIcHlwaS5vcmcCAWEAAAYgNh9pJUqVF-EtMCwGaZYcStFR07Rb").unwrap_err();
    assert_eq!(
        error.to_string(),
        "Deserialization error: field data extends past end of buffer"
    );
}

#[test]
fn it_checks_project_names_end_to_end() -> TestResult {
    let mut token = Token::create("pypi.org", "id", "k");
    token.restrict(&RestrictionParameters::new().project_names(["a", "b"]))?;
    let token = Token::load(&token.dump())?;

    token.check("k", &Context::new().with_project_name("a"))?;

    let error = token
        .check("k", &Context::new().with_project_name("c"))
        .unwrap_err();
    assert_eq!(
        Error::from(error).to_string(),
        "Error while validating token: This token can only be used for project(s): a, b. Received: c"
    );

    let error = token
        .check("wrong", &Context::new().with_project_name("a"))
        .unwrap_err();
    assert!(matches!(
        error,
        ValidationError::Macaroon(VerifyError::SignatureMismatch)
    ));
    assert_eq!(error.to_string(), "Signatures do not match");
    Ok(())
}

#[test]
fn it_attaches_every_kind_in_registry_order() -> TestResult {
    let mut token = token();
    token.restrict(
        &RestrictionParameters::new()
            .legacy_window(10, 20)
            .legacy_noop(true)
            .user_id(USER_ID)
            .project_ids([PROJECT_ID])
            .project_names(["a"])
            .window(10, 20),
    )?;

    let caveats: Vec<&[u8]> = token.macaroon().caveats().collect();
    assert_eq!(
        caveats,
        vec![
            &b"[0,20,10]"[..],
            &br#"[1,["a"]]"#[..],
            format!(r#"[2,["{PROJECT_ID}"]]"#).as_bytes(),
            format!(r#"[3,"{USER_ID}"]"#).as_bytes(),
            &br#"{"version":1,"permissions":"user"}"#[..],
            &br#"{"nbf":10,"exp":20}"#[..],
        ]
    );

    assert_eq!(
        token.restrictions()?,
        vec![
            Restriction::from(DateRestriction::new(10, 20)),
            ProjectNamesRestriction::new(["a"]).into(),
            ProjectIdsRestriction::new([PROJECT_ID]).into(),
            UserIdRestriction::new(USER_ID).into(),
            LegacyNoopRestriction.into(),
            LegacyDateRestriction::new(10, 20).into(),
        ]
    );

    let context = Context::new()
        .with_now(15)
        .with_project_name("a")
        .with_project_id(PROJECT_ID)
        .with_user_id(USER_ID);
    token.check("ohsosecret", &context)?;
    Ok(())
}

#[test]
fn it_chains_restrictions() -> TestResult {
    let mut token = token();
    token
        .restrict(&RestrictionParameters::new().project_names(["a", "b"]))?
        .restrict(&RestrictionParameters::new().project_names(["b", "c"]))?;

    token.check("ohsosecret", &Context::new().with_project_name("b"))?;
    assert!(
        token
            .check("ohsosecret", &Context::new().with_project_name("a"))
            .is_err()
    );
    Ok(())
}

#[test]
fn it_accepts_timezone_aware_bounds() -> TestResult {
    let mut token = token();
    token.restrict(&RestrictionParameters::new().window(
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap(),
    ))?;

    assert_eq!(
        token.restrictions()?,
        vec![Restriction::from(DateRestriction::new(
            1_577_836_800,
            1_577_923_200
        ))]
    );
    token.check("ohsosecret", &Context::new().with_now(1_577_836_800))?;
    assert!(
        token
            .check("ohsosecret", &Context::new().with_now(1_577_923_200))
            .is_err()
    );
    Ok(())
}

#[test]
fn it_reports_missing_context() -> TestResult {
    let mut token = token();
    token.restrict(&RestrictionParameters::new().project_ids([PROJECT_ID]))?;

    let error = token
        .check("ohsosecret", &Context::new().with_project_name("a"))
        .unwrap_err();
    assert!(matches!(
        error,
        ValidationError::MissingContext {
            field: ContextField::ProjectId
        }
    ));
    Ok(())
}

#[test]
fn it_rejects_unrecognized_caveats_during_check() -> TestResult {
    let mut macaroon = token().macaroon().clone();
    macaroon.add_first_party_caveat(r#"{"version":1,"permissions":"something"}"#)?;
    let token = Token::new("pypi", macaroon);

    let error = token.check("ohsosecret", &Context::new()).unwrap_err();
    assert!(matches!(
        error,
        ValidationError::Caveat(LoadError::UnrecognizedRestriction { .. })
    ));
    assert!(matches!(
        token.restrictions(),
        Err(LoadError::UnrecognizedRestriction { .. })
    ));
    Ok(())
}

#[test]
fn it_rejects_incomplete_windows() {
    let mut token = token();
    let error = token
        .restrict(&RestrictionParameters::new().not_after(10))
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "`not_before` and `not_after` parameters must be used together. \
         Either define both or neither. \
         Received not_before=None and not_after=10"
    );
    assert!(token.macaroon().caveats().next().is_none());
}

#[test]
fn it_round_trips_v1_tokens() -> TestResult {
    let options = TokenOptions {
        format: Format::V1,
        ..TokenOptions::default()
    };
    let mut token = Token::create_with("pypi.org", "id", "k", &options)?;
    token.restrict(&RestrictionParameters::new().project_names(["a"]))?;

    let loaded: Token = token.to_string().parse()?;
    assert_eq!(loaded.macaroon().format(), Format::V1);
    assert_eq!(loaded.dump(), token.dump());
    loaded.check("k", &Context::new().with_project_name("a"))?;
    Ok(())
}

#[test]
fn it_is_idempotent_through_dump_and_load() -> TestResult {
    let mut token = token();
    token.restrict(&RestrictionParameters::new().legacy_project_names(["a"]))?;

    let dumped = token.dump();
    assert_eq!(Token::load(&dumped)?.dump(), dumped);
    Ok(())
}
