pub mod table {
    pub const USER_TABLE: &str = "users";
    pub const EVENT_TABLE: &str = "events";
    pub const PARTICIPATION_TABLE: &str = "participations";
    pub const INVITATION_TABLE: &str = "invitations";
    pub const CONTRIBUTION_TABLE: &str = "contributions";
    pub const CUSTOM_FIELD_DEFINITION_TABLE: &str = "custom_field_definitions";
    pub const CUSTOM_FIELD_VALUE_TABLE: &str = "custom_field_values";
    pub const POLL_TABLE: &str = "polls";
    pub const POLL_OPTION_TABLE: &str = "poll_options";
    pub const VOTE_TABLE: &str = "votes";
    pub const VOTE_SUBMISSION_TABLE: &str = "vote_submissions";
    pub const COMMENT_TABLE: &str = "comments";
    pub const REACTION_TABLE: &str = "reactions";
    pub const DOCUMENT_TABLE: &str = "documents";
    pub const EVENT_IMAGE_TABLE: &str = "event_images";
}

pub mod index {
    pub const UNIQ_USER_USERNAME: &str = "uniq_user_username";
    pub const UNIQ_USER_EMAIL: &str = "uniq_user_email";
    pub const UNIQ_PARTICIPATION: &str = "uniq_participation_event_user";
    pub const UNIQ_INVITE_USER: &str = "uniq_invite_user_per_event";
    pub const UNIQ_INVITE_EMAIL: &str = "uniq_invite_email_per_event";
    pub const UNIQ_INVITE_TOKEN: &str = "uniq_invite_token_hash";
    pub const UNIQ_CUSTOM_FIELD_KEY: &str = "uniq_custom_field_key_per_event";
    pub const UNIQ_CUSTOM_FIELD_ANSWER: &str = "uniq_custom_field_answer_per_participant";
    pub const UNIQ_POLL_OPTION_LABEL: &str = "uniq_poll_option_label";
    pub const UNIQ_VOTE: &str = "uniq_vote_per_option_user";
    pub const UNIQ_VOTE_SUBMISSION: &str = "uniq_vote_submission_per_user";
    pub const UNIQ_REACTION: &str = "uniq_reaction_per_user_emoji";
}

pub mod limits {
    pub const DEFAULT_INVITATION_TTL_HOURS: i64 = 168;
    pub const MAX_INVITATION_TTL_HOURS: i64 = 24 * 90;
    pub const DEFAULT_PAGE_SIZE: usize = 20;
    pub const MAX_PAGE_SIZE: usize = 100;
    pub const INVITATION_TOKEN_LEN: usize = 43;
    pub const RECORD_KEY_LEN: usize = 20;
}
