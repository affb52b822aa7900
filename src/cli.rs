// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sshbatch",
    version,
    about = "Run a file of shell commands on a remote host over SSH",
    long_about = "sshbatch reads a newline-delimited list of shell commands and runs them on a single remote host.\nCommands run one at a time over one session, or split into contiguous chunks that run\nconcurrently over several independent sessions. Results are always reported in file order.",
    after_help = "EXAMPLES:\n  Run commands.txt sequentially:   sshbatch admin@10.0.0.5 commands.txt\n  Run across 4 parallel sessions:  sshbatch --parallel -w 4 admin@10.0.0.5 commands.txt\n  Use a configuration file:        sshbatch --config config.yaml\n  Connect to an old server:        sshbatch --legacy-algorithms -i ~/.ssh/id_rsa root@old-host cmds.txt\n\nExit codes: 0 (every command exited 0), 1 (any failure or nothing ran)"
)]
pub struct Cli {
    #[arg(help = "Target host in [user@]hostname[:port] format\nFalls back to 'hostname' from the configuration file")]
    pub destination: Option<String>,

    #[arg(help = "File with one command per line; blank lines and '#' comments are skipped\nFalls back to 'commands_file' from the configuration file, then commands.txt")]
    pub commands_file: Option<PathBuf>,

    #[arg(short = 'u', long, help = "Username for the SSH connection")]
    pub user: Option<String>,

    #[arg(short = 'p', long, help = "SSH port [default: 22]")]
    pub port: Option<u16>,

    #[arg(
        short = 'i',
        long,
        help = "SSH private key file path\nUsed when the file exists, otherwise password authentication is attempted"
    )]
    pub identity: Option<PathBuf>,

    #[arg(
        long,
        help = "Prompt for a password (or read it from SSHBATCH_PASSWORD)"
    )]
    pub password: bool,

    #[arg(
        long,
        help = "Split the command list across several concurrent sessions"
    )]
    pub parallel: bool,

    #[arg(
        short = 'w',
        long,
        help = "Number of concurrent sessions in parallel mode [default: 4]"
    )]
    pub workers: Option<usize>,

    #[arg(
        long,
        help = "Negotiate only older key exchange and cipher algorithms\n(diffie-hellman-group14/group1, aes-ctr) for servers that reject modern ones"
    )]
    pub legacy_algorithms: bool,

    #[arg(
        long,
        help = "Pause between commands in sequential mode, in milliseconds [default: 500]"
    )]
    pub delay_ms: Option<u64>,

    #[arg(
        long,
        help = "Per-command timeout in seconds (0 for unlimited) [default: 0]"
    )]
    pub timeout: Option<u64>,

    #[arg(long, help = "Connection timeout in seconds [default: 30]")]
    pub connect_timeout: Option<u64>,

    #[arg(
        long,
        help = "Host key checking mode (yes/no/accept-new) [default: accept-new]\n  yes        - Strict checking against known_hosts\n  no         - Accept all host keys (insecure, testing only)\n  accept-new - Accept new hosts, reject changed keys"
    )]
    pub strict_host_key_checking: Option<String>,

    #[arg(
        long,
        help = "Configuration file path (YAML or JSON)\nA template is written if the file does not exist"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,
}
