//! A command-line front end for the election service.
//! Each invocation logs in, drives one screen state machine against the
//! configured service, and prints what that screen would show.

use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{info, warn};

use evote_client::{
    api::{ElectionClient, HttpTransport},
    model::{CandidateId, CandidateSpec, Credentials, ElectionId, Role},
    screen::{
        detail::{CandidateAction, DetailPhase, ResultsPanel, VoteError},
        form::{CandidateField, SubmitBlocked, SubmitError},
        list::{DeleteError, ListPhase},
        ElectionDetail, ElectionForm, ElectionList,
    },
    Config, Session,
};

const PROGRAM_NAME: &str = "evote";

const ABOUT_TEXT: &str = "Browse, vote in, and manage elections.

EXIT CODES:
     0: Success.
     1: A request or validation failed.
     2: The action was refused.";

const ROLE: &str = "role";
const USERNAME: &str = "username";
const PASSWORD: &str = "password";
const VERBOSE: &str = "verbose";

const LIST: &str = "list";
const SHOW: &str = "show";
const VOTE: &str = "vote";
const CREATE: &str = "create";
const EDIT: &str = "edit";
const DELETE: &str = "delete";

const ELECTION_ID: &str = "ELECTION_ID";
const CANDIDATE_ID: &str = "CANDIDATE_ID";
const NAME: &str = "name";
const DESCRIPTION: &str = "description";
const START: &str = "start";
const END: &str = "end";
const INACTIVE: &str = "inactive";
const ACTIVE: &str = "active";
const CANDIDATE: &str = "candidate";
const YES: &str = "yes";

const CANDIDATE_HELP: &str = "A candidate as NAME:PARTY[:BIO].\n\
Repeat for each candidate, in order.";

const SUCCESS: u8 = 0;
const FAILED: u8 = 1;
const REFUSED: u8 = 2;

type Client = ElectionClient<HttpTransport>;
type LoggedIn = Session<Client>;

/// Parse a `NAME:PARTY[:BIO]` candidate. The bio may itself contain colons.
fn parse_candidate(value: &str) -> Result<CandidateSpec, String> {
    let mut parts = value.splitn(3, ':');
    let name = parts.next().unwrap_or_default();
    let party = parts
        .next()
        .ok_or_else(|| format!("expected NAME:PARTY[:BIO], got `{value}`"))?;
    let bio = parts.next().unwrap_or_default();
    Ok(CandidateSpec {
        name: name.to_string(),
        party: party.to_string(),
        bio: bio.to_string(),
    })
}

fn election_id_arg() -> Arg {
    Arg::new(ELECTION_ID)
        .help("Identifier of the election")
        .action(ArgAction::Set)
        .required(true)
}

fn field_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help).action(ArgAction::Set)
}

fn candidate_arg() -> Arg {
    Arg::new(CANDIDATE)
        .long(CANDIDATE)
        .help(CANDIDATE_HELP)
        .action(ArgAction::Append)
        .value_parser(parse_candidate)
}

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .subcommand_required(true)
        .arg(
            Arg::new(ROLE)
                .long(ROLE)
                .help("Log in as a student or an admin")
                .action(ArgAction::Set)
                .value_parser(["student", "admin"])
                .required(true),
        )
        .arg(
            Arg::new(USERNAME)
                .long(USERNAME)
                .action(ArgAction::Set)
                .required(true),
        )
        .arg(
            Arg::new(PASSWORD)
                .long(PASSWORD)
                .action(ArgAction::Set)
                .required(true),
        )
        .arg(
            Arg::new(VERBOSE)
                .long(VERBOSE)
                .short('v')
                .help("Log HTTP traffic")
                .action(ArgAction::SetTrue),
        )
        .subcommand(Command::new(LIST).about("List every election"))
        .subcommand(
            Command::new(SHOW)
                .about("Show an election; admins also see live results")
                .arg(election_id_arg()),
        )
        .subcommand(
            Command::new(VOTE)
                .about("Vote for a candidate")
                .arg(election_id_arg())
                .arg(
                    Arg::new(CANDIDATE_ID)
                        .help("Identifier of the candidate")
                        .action(ArgAction::Set)
                        .required(true),
                ),
        )
        .subcommand(
            Command::new(CREATE)
                .about("Create an election (admin only)")
                .arg(field_arg(NAME, "Election name").required(true))
                .arg(field_arg(DESCRIPTION, "Election description").required(true))
                .arg(field_arg(START, "Start time").required(true))
                .arg(field_arg(END, "End time").required(true))
                .arg(
                    Arg::new(INACTIVE)
                        .long(INACTIVE)
                        .help("Create the election inactive")
                        .action(ArgAction::SetTrue),
                )
                .arg(candidate_arg().required(true)),
        )
        .subcommand(
            Command::new(EDIT)
                .about("Edit an election (admin only)")
                .after_help("Candidates, if given, replace the existing ones.")
                .arg(election_id_arg())
                .arg(field_arg(NAME, "New election name"))
                .arg(field_arg(DESCRIPTION, "New description"))
                .arg(field_arg(START, "New start time"))
                .arg(field_arg(END, "New end time"))
                .arg(
                    field_arg(ACTIVE, "Whether the election is active")
                        .value_parser(clap::value_parser!(bool)),
                )
                .arg(candidate_arg()),
        )
        .subcommand(
            Command::new(DELETE)
                .about("Delete an election (admin only)")
                .arg(election_id_arg())
                .arg(
                    Arg::new(YES)
                        .long(YES)
                        .short('y')
                        .help("Confirm the deletion")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn role(args: &ArgMatches) -> Role {
    match args.get_one::<String>(ROLE).map(String::as_str) {
        Some("admin") => Role::Admin,
        _ => Role::Student,
    }
}

fn string_arg<'a>(args: &'a ArgMatches, name: &str) -> Option<&'a str> {
    args.get_one::<String>(name).map(String::as_str)
}

fn election_id(args: &ArgMatches) -> ElectionId {
    ElectionId::from(string_arg(args, ELECTION_ID).unwrap_or_default())
}

fn candidates(args: &ArgMatches) -> Option<Vec<CandidateSpec>> {
    args.get_many::<CandidateSpec>(CANDIDATE)
        .map(|values| values.cloned().collect())
}

async fn list(session: &LoggedIn) -> u8 {
    let mut screen = ElectionList::new(session);
    screen.refresh(session.client()).await;
    if let ListPhase::Unavailable(failure) = screen.phase() {
        println!("{failure}");
        return FAILED;
    }
    for card in screen.cards() {
        let election = card.election;
        let actions = if card.manageable { "  [edit, delete]" } else { "" };
        println!(
            "{}  {}  ({}){actions}",
            election.id, election.name, card.status
        );
        println!("    {}", election.election_info.description);
    }
    println!("{} election(s)", screen.elections().len());
    SUCCESS
}

fn print_detail(screen: &ElectionDetail) {
    if let Some(election) = screen.election() {
        let info = &election.election_info;
        println!("{} ({})", election.name, election.id);
        println!("{}", info.description);
        println!("{} - {}", info.start_time, info.end_time);
    }
    for row in screen.rows() {
        let candidate = row.candidate;
        let action = match row.action {
            CandidateAction::Vote { enabled: true } => "[vote]".to_string(),
            CandidateAction::Vote { enabled: false } => "[vote disabled]".to_string(),
            CandidateAction::VoteCount(votes) => format!("{votes} vote(s)"),
            CandidateAction::Hidden => String::new(),
        };
        println!(
            "  {}  {} ({})  {action}",
            candidate.id, candidate.name, candidate.party
        );
        if !candidate.bio.is_empty() {
            println!("      {}", candidate.bio);
        }
    }
    match screen.results_panel() {
        ResultsPanel::Ready(results) => {
            println!("Live results: {} vote(s)", results.total_votes);
            for result in &results.results {
                println!(
                    "  {}  {} vote(s)  {}%",
                    result.name, result.votes, result.percentage
                );
            }
        }
        ResultsPanel::Unavailable(failure) => warn!("{failure}"),
        ResultsPanel::Hidden | ResultsPanel::Pending => {}
    }
}

/// Load the detail screen, returning `None` if the election is unavailable.
async fn load_detail(session: &LoggedIn, id: ElectionId) -> Option<ElectionDetail> {
    let mut screen = ElectionDetail::new(session, id);
    screen.load(session.client()).await;
    if let DetailPhase::Unavailable(failure) = screen.phase() {
        println!("{failure}");
        return None;
    }
    Some(screen)
}

async fn show(session: &LoggedIn, args: &ArgMatches) -> u8 {
    match load_detail(session, election_id(args)).await {
        Some(screen) => {
            print_detail(&screen);
            SUCCESS
        }
        None => FAILED,
    }
}

async fn vote(session: &LoggedIn, args: &ArgMatches) -> u8 {
    let Some(mut screen) = load_detail(session, election_id(args)).await else {
        return FAILED;
    };
    let candidate = CandidateId::from(string_arg(args, CANDIDATE_ID).unwrap_or_default());
    let code = match screen.vote(session.client(), &candidate).await {
        Ok(()) => SUCCESS,
        Err(VoteError::Rejected(reason)) => {
            println!("Vote refused: {reason}");
            REFUSED
        }
        Err(VoteError::Failed(failure)) => {
            println!("{failure}");
            FAILED
        }
        Err(err @ VoteError::Discarded) => {
            println!("{err}");
            FAILED
        }
    };
    if let Some(confirmation) = screen.take_confirmation() {
        println!("{confirmation}");
    }
    if let Some(notice) = screen.notice() {
        warn!("{notice}");
    }
    print_detail(&screen);
    code
}

/// Apply the field arguments to a form. Only the fields given are changed.
fn fill_form(form: &mut ElectionForm, args: &ArgMatches) {
    if let Some(name) = string_arg(args, NAME) {
        form.set_name(name);
    }
    if let Some(description) = string_arg(args, DESCRIPTION) {
        form.set_description(description);
    }
    if let Some(start) = string_arg(args, START) {
        form.set_start_time(start);
    }
    if let Some(end) = string_arg(args, END) {
        form.set_end_time(end);
    }
    if let Some(active) = args.try_get_one::<bool>(ACTIVE).ok().flatten() {
        form.set_active(*active);
    }
    if args.try_get_one::<bool>(INACTIVE).ok().flatten() == Some(&true) {
        form.set_active(false);
    }
    if let Some(candidates) = candidates(args) {
        for (i, candidate) in candidates.iter().enumerate() {
            if i >= form.fields().candidates.len() {
                form.add_candidate();
            }
            form.update_candidate(i, CandidateField::Name, candidate.name.as_str());
            form.update_candidate(i, CandidateField::Party, candidate.party.as_str());
            form.update_candidate(i, CandidateField::Bio, candidate.bio.as_str());
        }
        while form.fields().candidates.len() > candidates.len().max(1) {
            let last = form.fields().candidates.len() - 1;
            form.remove_candidate(last);
        }
    }
}

async fn submit(client: &Client, mut form: ElectionForm) -> u8 {
    match form.submit(client).await {
        Ok(election) => {
            println!("Saved election {} ({})", election.name, election.id);
            SUCCESS
        }
        Err(SubmitError::Blocked(SubmitBlocked::Invalid(errors))) => {
            for (field, message) in errors.iter() {
                println!("{field}: {message}");
            }
            FAILED
        }
        Err(SubmitError::Blocked(reason)) => {
            println!("Not saved: {reason}");
            REFUSED
        }
        Err(err) => {
            println!("{err}");
            FAILED
        }
    }
}

async fn create(session: &LoggedIn, args: &ArgMatches) -> u8 {
    let Some(mut form) = ElectionList::new(session).create_form() else {
        println!("Only admins can create elections");
        return REFUSED;
    };
    fill_form(&mut form, args);
    submit(session.client(), form).await
}

async fn edit(session: &LoggedIn, args: &ArgMatches) -> u8 {
    if !session.is_admin() {
        println!("Only admins can edit elections");
        return REFUSED;
    }
    let mut screen = ElectionList::new(session);
    screen.refresh(session.client()).await;
    if let ListPhase::Unavailable(failure) = screen.phase() {
        println!("{failure}");
        return FAILED;
    }
    let id = election_id(args);
    let Some(mut form) = screen.edit_form(&id) else {
        println!("No election with id {id}");
        return FAILED;
    };
    fill_form(&mut form, args);
    submit(session.client(), form).await
}

async fn delete(session: &LoggedIn, args: &ArgMatches) -> u8 {
    let mut screen = ElectionList::new(session);
    screen.refresh(session.client()).await;
    if let ListPhase::Unavailable(failure) = screen.phase() {
        println!("{failure}");
        return FAILED;
    }
    let id = election_id(args);
    if let Err(reason) = screen.request_delete(&id) {
        println!("Delete refused: {reason}");
        return REFUSED;
    }
    if let Some(prompt) = screen.delete_prompt() {
        println!("{}: {}", prompt.title, prompt.election.name);
        println!("{}", prompt.message);
    }
    if !args.get_flag(YES) {
        screen.cancel_delete();
        println!("Not deleted. Pass --{YES} to confirm.");
        return REFUSED;
    }
    match screen.confirm_delete(session.client()).await {
        Ok(()) => {
            println!("Deleted. {} election(s) remain", screen.elections().len());
            SUCCESS
        }
        Err(DeleteError::Rejected(reason)) => {
            println!("Delete refused: {reason}");
            REFUSED
        }
        Err(err) => {
            println!("{err}");
            FAILED
        }
    }
}

/// Log in and run the requested command, returning the exit code.
async fn run(config: &Config, args: &ArgMatches) -> u8 {
    let client = match evote_client::connect(config) {
        Ok(client) => client,
        Err(err) => {
            println!("{err}");
            return FAILED;
        }
    };
    let credentials = Credentials::new(
        string_arg(args, USERNAME).unwrap_or_default(),
        string_arg(args, PASSWORD).unwrap_or_default(),
    );
    let session = match Session::login(client, role(args), &credentials).await {
        Ok(session) => session,
        Err(err) => {
            println!("{err}");
            return FAILED;
        }
    };

    let code = match args.subcommand() {
        Some((LIST, _)) => list(&session).await,
        Some((SHOW, sub)) => show(&session, sub).await,
        Some((VOTE, sub)) => vote(&session, sub).await,
        Some((CREATE, sub)) => create(&session, sub).await,
        Some((EDIT, sub)) => edit(&session, sub).await,
        Some((DELETE, sub)) => delete(&session, sub).await,
        _ => REFUSED,
    };
    session.logout();
    code
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = cli().get_matches();
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            std::process::exit(FAILED.into())
        }
    };

    // Logging is best-effort for a command-line tool.
    match evote_client::logging::init(&config) {
        Ok(()) => evote_client::logging::set_transport_logging(args.get_flag(VERBOSE)),
        Err(err) => eprintln!("Logging disabled: {err}"),
    }
    info!("Using election service at {}", config.base_url());

    let exit_code = run(&config, &args).await;
    std::process::exit(exit_code.into())
}
