#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Command, LangArg};
    use clap::Parser;
    use showroom_compiler::SupportedLanguage;
    use std::path::PathBuf;

    #[test]
    fn test_build_defaults_leave_config_in_charge() {
        let cli = Cli::try_parse_from(["showroom", "build"]).unwrap();
        match cli.command {
            Command::Build(args) => {
                assert!(args.out_dir.is_none());
                assert!(args.docs_dir.is_none());
            }
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn test_build_out_dir() {
        let cli = Cli::try_parse_from(["showroom", "build", "--out-dir", "public"]).unwrap();
        match cli.command {
            Command::Build(args) => assert_eq!(args.out_dir, Some(PathBuf::from("public"))),
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli =
            Cli::try_parse_from(["showroom", "check", "--config", "site/showroom.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("site/showroom.toml")));
    }

    #[test]
    fn test_dev_port_and_host() {
        let cli =
            Cli::try_parse_from(["showroom", "dev", "-p", "8080", "--host", "0.0.0.0"]).unwrap();
        match cli.command {
            Command::Dev(args) => {
                assert_eq!(args.port, Some(8080));
                assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
            }
            _ => panic!("expected dev command"),
        }
    }

    #[test]
    fn test_compile_lang() {
        let cli =
            Cli::try_parse_from(["showroom", "compile", "demo.txt", "--lang", "tsx"]).unwrap();
        match cli.command {
            Command::Compile(args) => {
                assert_eq!(args.lang, Some(LangArg::Tsx));
                assert_eq!(
                    SupportedLanguage::from(LangArg::Tsx),
                    SupportedLanguage::Tsx
                );
            }
            _ => panic!("expected compile command"),
        }
    }

    #[test]
    fn test_compile_rejects_unknown_lang() {
        assert!(Cli::try_parse_from(["showroom", "compile", "a.vue", "--lang", "vue"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["showroom", "-v", "-q", "build"]).is_err());
    }
}
