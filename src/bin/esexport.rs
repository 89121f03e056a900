use structopt::StructOpt;

use esexport::{
    esexport::{run, Error},
    settings::esexport as settings,
};

fn main() -> Result<(), Error> {
    let opts = settings::Opts::from_args();
    let settings = settings::Settings::new(&opts).map_err(|e| Error::Settings { source: e })?;

    match opts.cmd {
        settings::Command::Run => esexport::utils::launch::launch_with_runtime(run(settings))
            .map_err(|e| Error::Execution { source: e }),
        settings::Command::Config => {
            let printed = serde_json::to_string_pretty(&settings)
                .map_err(|e| Error::Execution { source: Box::new(e) })?;
            println!("{}", printed);
            Ok(())
        }
    }
}
