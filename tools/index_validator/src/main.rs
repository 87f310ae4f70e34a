use pkgindex_core::resolver::{validate_channel, validate_repository};
use pkgindex_core::source::DefaultSource;

struct Args {
    channel: String,
    repository: String,
    test_repositories: bool,
}

fn usage() -> ! {
    eprintln!(
        "usage: index_validator [--channel <channel.json>] [--repository <repository.json>] \
         [--test-repositories]"
    );
    std::process::exit(2);
}

fn parse_args() -> Args {
    let mut args = Args {
        channel: "channel.json".to_string(),
        repository: "repository.json".to_string(),
        test_repositories: false,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--channel" => match iter.next() {
                Some(value) => args.channel = value,
                None => usage(),
            },
            "--repository" => match iter.next() {
                Some(value) => args.repository = value,
                None => usage(),
            },
            "--test-repositories" => args.test_repositories = true,
            other => {
                if let Some(value) = other.strip_prefix("--channel=") {
                    args.channel = value.to_string();
                } else if let Some(value) = other.strip_prefix("--repository=") {
                    args.repository = value.to_string();
                } else {
                    eprintln!("invalid argument: {}", other);
                    usage();
                }
            }
        }
    }
    args
}

fn main() {
    let args = parse_args();

    let source = match DefaultSource::new(".") {
        Ok(source) => source,
        Err(e) => {
            eprintln!("validator error: {}", e);
            std::process::exit(1);
        }
    };

    let channel = source
        .exists_locally(&args.channel)
        .then(|| validate_channel(&args.channel, &source, args.test_repositories));
    let repository = source
        .exists_locally(&args.repository)
        .then(|| validate_repository(&args.repository, &source));

    if channel.is_none() && repository.is_none() {
        eprintln!(
            "neither {} nor {} found",
            args.channel, args.repository
        );
        usage();
    }

    let ok = channel.as_ref().map_or(true, |r| r.is_pass())
        && repository.as_ref().map_or(true, |r| r.is_pass());

    let summary = serde_json::json!({
        "channel": channel,
        "repository": repository,
    });
    match serde_json::to_string_pretty(&summary) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("validator error: {}", e);
            std::process::exit(1);
        }
    }

    std::process::exit(if ok { 0 } else { 1 });
}
