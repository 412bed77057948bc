//! Form selectors of the BOCA administrative pages

/// `input[name="<name>"]`
pub fn input(name: &str) -> String {
    format!("input[name=\"{}\"]", name)
}

/// `select[name="<name>"]`
pub fn select(name: &str) -> String {
    format!("select[name=\"{}\"]", name)
}

/// Submit button by its caption
pub fn button(caption: &str) -> String {
    format!("input[type=\"submit\"][value=\"{}\"]", caption)
}

/// Link with exactly this `href`
pub fn link(href: &str) -> String {
    format!("a[href=\"{}\"]", href.replace('\\', "\\\\").replace('"', "\\\""))
}

pub mod login {
    pub const USERNAME: &str = "input[name=\"name\"]";
    pub const PASSWORD: &str = "input[name=\"password\"]";
    pub const SUBMIT: &str = "input[name=\"Submit\"]";
}

/// Submit captions
pub mod caption {
    pub const SEND: &str = "Send";
    pub const ACTIVATE: &str = "Activate";
    pub const CLEAR: &str = "Clear";
    pub const DELETE: &str = "Delete";
    pub const IMPORT: &str = "Import";
}

/// Value of the entity dropdown option that opens a blank form
pub const NEW_OPTION: &str = "new";

/// Split start-date inputs shared by the contest and site forms
pub mod start_date {
    pub const HOUR: &str = "startdateh";
    pub const MINUTE: &str = "startdatemin";
    pub const DAY: &str = "startdated";
    pub const MONTH: &str = "startdatem";
    pub const YEAR: &str = "startdatey";
}

pub mod contest {
    pub const SELECT: &str = "contest";
    pub const NAME: &str = "name";
    pub const DURATION: &str = "duration";
    pub const LAST_MILE_ANSWER: &str = "lastmileanswer";
    pub const LAST_MILE_SCORE: &str = "lastmilescore";
    pub const PENALTY: &str = "penalty";
    pub const MAX_FILE_SIZE: &str = "maxfilesize";
    pub const MAIN_SITE_URL: &str = "mainsiteurl";
    pub const MAIN_SITE: &str = "mainsite";
    pub const LOCAL_SITE: &str = "localsite";
}

pub mod site {
    pub const SELECT: &str = "site";
    pub const NAME: &str = "name";
    pub const DURATION: &str = "duration";
    pub const LAST_MILE_ANSWER: &str = "lastmileanswer";
    pub const LAST_MILE_SCORE: &str = "lastmilescore";
    pub const JUDGING: &str = "judging";
    pub const TASKING: &str = "tasking";
    pub const CHIEF: &str = "chiefname";
    pub const ACTIVE: &str = "active";
    pub const AUTO_END: &str = "autoend";
    pub const AUTO_JUDGE: &str = "autojudge";
    pub const GLOBAL_SCORE: &str = "globalscore";
    pub const SCORE_LEVEL: &str = "scorelevel";
    pub const GLOBAL_SCOREBOARD: &str = "globalscoreboard";
}

pub mod language {
    pub const NUMBER: &str = "langnumber";
    pub const NAME: &str = "langname";
    pub const EXTENSION: &str = "langextension";
}

pub mod problem {
    pub const NUMBER: &str = "problemnumber";
    pub const NAME: &str = "problemname";
    pub const PACKAGE: &str = "probleminput";
    pub const COLOR_NAME: &str = "colorname";
    pub const COLOR: &str = "color";
}

pub mod user {
    pub const SITE_NUMBER: &str = "usersitenumber";
    pub const NUMBER: &str = "usernumber";
    pub const NAME: &str = "username";
    pub const ICPC_ID: &str = "usericpcid";
    pub const TYPE: &str = "usertype";
    pub const ENABLED: &str = "userenabled";
    pub const MULTI_LOGIN: &str = "usermultilogin";
    pub const FULL_NAME: &str = "userfullname";
    pub const DESCRIPTION: &str = "userdesc";
    pub const IP: &str = "userip";
    pub const PASSWORD: &str = "passwordn1";
    pub const PASSWORD_CONFIRM: &str = "passwordn2";
    pub const CHANGE_PASSWORD: &str = "changepass";
    pub const IMPORT_FILE: &str = "importfile";
}
