use clap::{value_parser, crate_version, Arg, ArgAction, Command, ValueHint};

const GEOM_LONG_HELP: &str = "Read the drive parameters from the JSON file at PATH instead of the flags.
Required keys are cylinders, heads, sectors, and sector_size.  Optional keys are
source_interleave, target_interleave, start_sector, data_mode (mfm, rll),
verify_mode (crc16, ecc32, ecc56), write_precomp, reduced_write_current,
landing_zone (cylinder or null), seek_type (buffered, st506), and description.
To get an example use `wdikit geometry ...`";
const START_LONG_HELP: &str = "number of the first logical sector as written in the ID fields,
usually 1, some controllers number from 0";
const DESC_LONG_HELP: &str = "free text description stored in the image header,
repeat the option for more lines";

fn geometry_arg() -> Arg {
    Arg::new("geometry").short('g').long("geometry").value_name("PATH").help("JSON file with drive parameters")
        .long_help(GEOM_LONG_HELP)
        .value_hint(ValueHint::FilePath)
        .required(false)
}

fn indent_arg() -> Arg {
    Arg::new("indent").long("indent").help("JSON indentation, omit to minify")
        .value_name("SPACES")
        .value_parser(value_parser!(u16).range(0..16))
        .required(false)
}

/// Drive parameter flags, all of which give way to `--geometry`
fn drive_args() -> Vec<Arg> {
    vec![
        Arg::new("cylinders").short('c').long("cylinders").value_name("NUM").help("cylinders (1-2048)")
            .value_parser(value_parser!(u16).range(1..=2048))
            .required_unless_present("geometry")
            .conflicts_with("geometry"),
        Arg::new("heads").short('H').long("heads").value_name("NUM").help("heads (1-16)")
            .value_parser(value_parser!(u8).range(1..=16))
            .required_unless_present("geometry")
            .conflicts_with("geometry"),
        Arg::new("sectors").short('s').long("sectors").value_name("NUM").help("sectors per track (1-63)")
            .value_parser(value_parser!(u8).range(1..=63))
            .required_unless_present("geometry")
            .conflicts_with("geometry"),
        Arg::new("size").short('z').long("size").value_name("BYTES").help("sector size")
            .value_parser(["128","256","512","1024","1k"])
            .required_unless_present("geometry")
            .conflicts_with("geometry"),
        Arg::new("source-interleave").long("source-interleave").value_name("NUM").help("interleave the dump was captured with")
            .value_parser(value_parser!(u8).range(1..=63))
            .default_value("1")
            .conflicts_with("geometry"),
        Arg::new("target-interleave").long("target-interleave").value_name("NUM").help("interleave to lay down in the image")
            .value_parser(value_parser!(u8).range(1..=63))
            .default_value("1")
            .conflicts_with("geometry"),
        Arg::new("start-sector").long("start-sector").value_name("NUM").help("first logical sector number")
            .long_help(START_LONG_HELP)
            .value_parser(value_parser!(u8))
            .default_value("1")
            .conflicts_with("geometry"),
        Arg::new("rll").long("rll").help("RLL data separator, implies 56-bit ECC")
            .action(ArgAction::SetTrue)
            .conflicts_with("geometry"),
        Arg::new("verify").long("verify").value_name("MODE").help("data verify mode")
            .value_parser(["crc16","ecc32","ecc56"])
            .default_value("crc16")
            .conflicts_with("geometry"),
        Arg::new("precomp").long("precomp").value_name("CYL").help("write precompensation start cylinder")
            .value_parser(value_parser!(u16).range(0..=2048))
            .conflicts_with("geometry"),
        Arg::new("rwc").long("rwc").value_name("CYL").help("reduced write current start cylinder")
            .value_parser(value_parser!(u16).range(0..=2048))
            .conflicts_with("geometry"),
        Arg::new("landing").long("landing").value_name("CYL").help("landing zone, omit for auto parking")
            .value_parser(value_parser!(u16).range(0..=2048))
            .conflicts_with("geometry"),
        Arg::new("seek").long("seek").value_name("TYPE").help("drive seeking")
            .value_parser(["buffered","st506"])
            .default_value("buffered")
            .conflicts_with("geometry"),
        Arg::new("desc").long("desc").value_name("TEXT").help("image description")
            .long_help(DESC_LONG_HELP)
            .action(ArgAction::Append)
            .conflicts_with("geometry"),
    ]
}

pub fn build_cli() -> Command {
    let long_help = "wdikit is always invoked with exactly one of several subcommands.
Set RUST_LOG environment variable to control logging level.
  levels: trace,debug,info,warn,error

Limits of the conversion:
 - sector count, sector size and interleave are constant over the whole drive
 - cylinder and head numbers in the sector ID fields equal the physical address
 - no indication of bad blocks, CRC/ECC errors or unreadable tracks

Examples:
---------
convert a dump:        `wdikit convert -c 615 -H 4 -s 17 -z 512 --target-interleave 3 -i st225.img -o st225.wdi`
with a geometry file:  `wdikit convert -g st225.json -i st225.img -o st225.wdi`
write geometry file:   `wdikit geometry -c 615 -H 4 -s 17 -z 512 --indent 4 > st225.json`
show interleave:       `wdikit interleave -s 17 -i 3`
detect interleave:     `wdikit interleave --detect 1,7,13,2,8,14,3,9,15,4,10,16,5,11,17,6,12`";

    let mut main_cmd = Command::new("wdikit")
        .about("Converts raw hard disk dumps to WDI images.")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("convert")
        .arg(Arg::new("input").short('i').long("input").value_name("PATH").help("raw dump, stdin if omitted")
            .value_hint(ValueHint::FilePath)
            .required(false))
        .arg(Arg::new("output").short('o').long("output").value_name("PATH").help("WDI image to create, stdout if omitted")
            .value_hint(ValueHint::FilePath)
            .required(false))
        .arg(geometry_arg())
        .args(drive_args())
        .arg(Arg::new("force").short('F').long("force").help("convert even if the dump size does not match")
            .action(ArgAction::SetTrue))
        .about("convert a raw sector dump to a WDI image"));
    main_cmd = main_cmd.subcommand(Command::new("geometry")
        .arg(geometry_arg())
        .args(drive_args())
        .arg(indent_arg())
        .about("write validated drive parameters and derived sizes as JSON"));
    main_cmd = main_cmd.subcommand(Command::new("interleave")
        .arg(Arg::new("sectors").short('s').long("sectors").value_name("NUM").help("sectors per track (1-63)")
            .value_parser(value_parser!(u8).range(1..=63))
            .required_unless_present("detect"))
        .arg(Arg::new("interleave").short('i').long("interleave").value_name("NUM").help("interleave (1: none)")
            .value_parser(value_parser!(u8).range(1..=63))
            .required_unless_present("detect"))
        .arg(Arg::new("detect").long("detect").value_name("LIST").help("infer interleave from sector IDs")
            .long_help("comma delimited list of sector IDs in the order they pass under the head")
            .value_delimiter(',')
            .value_parser(value_parser!(u8))
            .conflicts_with_all(["sectors","interleave"]))
        .arg(indent_arg())
        .about("write an interleave table as JSON, or detect the interleave"));
    main_cmd = main_cmd.subcommand(Command::new("completions")
        .arg(Arg::new("shell").short('s').long("shell").value_name("SHELL").help("shell type")
            .value_parser(["bash","elv","fish","ps1","zsh"])
            .required(true))
        .about("write shell completion script to stdout"));
    main_cmd
}
