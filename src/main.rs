use roll_flow::{
    lifecycle::{CheckRollRequest, DamageRollRequest, RollEngine},
    rng::RngHandle,
    settings::RulesetSettings,
    ChatMessage, ChatSink, DialogSpec, RollDialog, RollSubmission,
};
use roll_terms::{AdvantageMode, DamageTag};
use std::time::Duration;

use async_trait::async_trait;

/// Interactive dialog on stdin: `a`dvantage, `d`isadvantage, empty for a
/// normal roll, `c` to cancel. Anything else is used as a bonus formula.
struct StdinDialog;

#[async_trait]
impl RollDialog for StdinDialog {
    async fn prompt(&self, spec: DialogSpec) -> Option<RollSubmission> {
        println!("{}", spec.title);
        println!("[a]dvantage / [d]isadvantage / [c]ancel / enter for normal,");
        println!("or type a bonus formula (e.g. \"+ 1d4\"):");
        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).ok().map(|_| line)
        })
        .await
        .ok()??;
        let line = line.trim();
        match line {
            "c" => None,
            "a" => Some(RollSubmission {
                advantage_mode: AdvantageMode::Advantage,
                ..RollSubmission::default()
            }),
            "d" => Some(RollSubmission {
                advantage_mode: AdvantageMode::Disadvantage,
                ..RollSubmission::default()
            }),
            "" => Some(RollSubmission::default()),
            bonus => Some(RollSubmission {
                bonus_formula: Some(bonus.to_string()),
                ..RollSubmission::default()
            }),
        }
    }
}

struct StdoutChat;

#[async_trait]
impl ChatSink for StdoutChat {
    async fn post(&self, message: ChatMessage) {
        println!("{} [{}]", message.flavor, message.speaker);
        println!("  {} = {}", message.formula, message.total);
        for die in &message.breakdown {
            println!(
                "  {}: rolled {:?}, kept {:?}",
                die.formula, die.rolls, die.kept
            );
        }
    }
}

fn usage() -> ! {
    eprintln!(
        "usage: roll-engine [--fast] [--advantage|--disadvantage] [--critical] \
         [--damage major/minor] [--settings file.toml] <formula>"
    );
    std::process::exit(2)
}

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    pretty_env_logger::init();

    let mut formula: Option<String> = None;
    let mut fast_forward = false;
    let mut advantage_mode = AdvantageMode::Normal;
    let mut critical = false;
    let mut damage: Option<DamageTag> = None;
    let mut settings = RulesetSettings::default();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--fast" => fast_forward = true,
            "--advantage" => advantage_mode = AdvantageMode::Advantage,
            "--disadvantage" => advantage_mode = AdvantageMode::Disadvantage,
            "--critical" => critical = true,
            "--damage" => {
                let spec = args.next().unwrap_or_else(|| usage());
                let mut halves = spec.splitn(2, '/');
                let major = match halves.next() {
                    Some(s) => s.to_string(),
                    None => usage(),
                };
                let minor = match halves.next() {
                    Some(s) => s.to_string(),
                    None => usage(),
                };
                damage = Some(DamageTag::new(&major, &minor));
            }
            "--settings" => {
                let path = args.next().unwrap_or_else(|| usage());
                let raw = std::fs::read_to_string(&path)
                    .unwrap_or_else(|e| panic!("cannot read {}: {}", path, e));
                settings = RulesetSettings::from_toml_str(&raw)
                    .unwrap_or_else(|e| panic!("cannot parse {}: {}", path, e));
            }
            _ if formula.is_none() && !arg.starts_with("--") => formula = Some(arg),
            _ => usage(),
        }
    }
    let formula = match formula {
        Some(f) => f,
        None => usage(),
    };

    let engine = RollEngine::new(
        settings,
        StdinDialog,
        StdoutChat,
        RngHandle::spawn(Duration::from_secs(300)),
    );

    let result = match damage {
        Some(tag) => {
            let mut request = DamageRollRequest::default();
            request.parts = vec![(formula, vec![tag])];
            request.title = "Damage Roll".to_string();
            request.speaker = whoami();
            request.fast_forward = fast_forward;
            request.to_message = true;
            request.options.critical = critical;
            engine
                .damage_roll(request)
                .await
                .map(|r| r.map(|report| vec![report]))
        }
        None => {
            let mut request = CheckRollRequest::default();
            request.formula = formula;
            request.title = "Check Roll".to_string();
            request.speaker = whoami();
            request.fast_forward = fast_forward;
            request.to_message = true;
            request.options.advantage_mode = advantage_mode;
            engine.check_roll(request).await
        }
    };

    match result {
        Ok(Some(_)) => {}
        Ok(None) => println!("cancelled"),
        Err(e) => {
            log::error!("roll failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn whoami() -> String {
    std::env::var("USER").unwrap_or_else(|_| "Roller".to_string())
}
